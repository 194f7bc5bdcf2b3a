//! Command-line front end.
//!
//! Each subcommand maps onto one client operation and prints the returned
//! records as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use crate::{
    application::{
        dtos::{CompareRequest, LibraryRequest, SearchRequest, DEFAULT_MAX_RESULTS},
        ModelSelection,
    },
    build_environment,
    domain::{Granularity, ModelId},
    infrastructure::FigureKind,
    settings::PlaygroundConfig,
    AppHandles, EnvironmentOptions,
};

/// Number of library entries shown when no limit is given.
const DEFAULT_LIBRARY_LIMIT: usize = 100;

#[derive(Debug, Parser)]
#[command(name = "playground", version, about = "Explore a remote semantic-matching service")]
pub struct Cli {
    /// Directory holding config.json and the result cache.
    #[arg(long, global = true, env = "PLAYGROUND_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Bypass the result cache for this invocation.
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the playground domains on the service.
    Domains,
    /// Compare two texts.
    Compare(CompareArgs),
    /// Search a library for entries similar to a query.
    Search(SearchArgs),
    /// List the documents of a library.
    Library(LibraryArgs),
    /// Set the active similarity model of a domain.
    Model(ModelArgs),
    /// Show a pre-computed clustering of a library.
    Clusters(ClusterArgs),
    /// Manage the configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First text; defaults to the configured example.
    pub text_a: Option<String>,
    /// Second text; defaults to the configured example.
    pub text_b: Option<String>,
    /// Model label from the configuration, or a numeric model id.
    #[arg(long)]
    pub model: Option<String>,
    /// Domain to compare in; defaults to the configured compare domain.
    #[arg(long)]
    pub domain: Option<String>,
    /// Also check whether the texts contradict each other.
    #[arg(long)]
    pub opposite_meaning: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Configured search use case.
    pub use_case: String,
    /// Query text; defaults to the use case's example query.
    pub query: Option<String>,
    #[arg(long)]
    pub threshold: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
}

#[derive(Debug, Args)]
pub struct LibraryArgs {
    /// Configured search use case.
    pub use_case: String,
    #[arg(long, default_value_t = DEFAULT_LIBRARY_LIMIT, conflicts_with = "all")]
    pub limit: usize,
    #[arg(long)]
    pub offset: Option<usize>,
    /// Fetch the whole library without pagination.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    pub domain: String,
    pub model_id: ModelId,
}

#[derive(Debug, Args)]
pub struct ClusterArgs {
    /// Use case label or artifact directory.
    pub use_case: String,
    #[arg(long, value_enum, default_value_t = GranularityArg::Broad)]
    pub granularity: GranularityArg,
    /// Print this figure instead of the library and topic tables.
    #[arg(long, value_enum)]
    pub figure: Option<FigureArg>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write the default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the active configuration, environment overrides included.
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    Broad,
    /// Also accepted as "detailed".
    #[value(alias = "detailed")]
    Fine,
}

impl From<GranularityArg> for Granularity {
    fn from(value: GranularityArg) -> Self {
        match value {
            GranularityArg::Broad => Granularity::Broad,
            GranularityArg::Fine => Granularity::Fine,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FigureArg {
    DocMap,
    Map,
    Tot,
}

impl From<FigureArg> for FigureKind {
    fn from(value: FigureArg) -> Self {
        match value {
            FigureArg::DocMap => FigureKind::DocMap,
            FigureArg::Map => FigureKind::Map,
            FigureArg::Tot => FigureKind::TopicsOverTime,
        }
    }
}

pub fn execute(cli: Cli) -> Result<()> {
    let options = EnvironmentOptions {
        data_dir: cli.data_dir,
        no_cache: cli.no_cache,
    };
    let handles = build_environment(&options).context("failed to bootstrap playground environment")?;

    match cli.command {
        Command::Domains => print_json(&handles.client.list_domains()?),
        Command::Compare(args) => compare(&handles, args),
        Command::Search(args) => search(&handles, args),
        Command::Library(args) => library(&handles, args),
        Command::Model(args) => {
            let active = handles.client.change_model(&args.domain, args.model_id)?;
            print_json(&json!({ "domain": args.domain, "model_id": active }))
        }
        Command::Clusters(args) => clusters(&handles, args),
        Command::Config(command) => config(&handles, command),
    }
}

fn compare(handles: &AppHandles, args: CompareArgs) -> Result<()> {
    let config = handles.config.current();
    let settings = &config.compare;

    let model_id = match &args.model {
        Some(model) => settings.resolve_model(model)?,
        None => settings
            .default_model()
            .map(|(_, id)| id)
            .ok_or_else(|| anyhow!("no models configured; pass --model <id>"))?,
    };
    let [default_a, default_b] = settings.default_inputs.clone();

    let mut selection = ModelSelection::new(args.domain.unwrap_or_else(|| settings.domain.clone()));
    let active = selection.ensure(&handles.client, model_id)?;

    let request = CompareRequest::new(
        args.text_a.unwrap_or(default_a),
        args.text_b.unwrap_or(default_b),
        selection.domain(),
        active,
    )
    .with_opposite_meaning(args.opposite_meaning);
    let result = handles.client.compare(&request)?;

    let percent = result.percent();
    let verdict = result.verdict();
    print_json(&json!({
        "domain": request.domain,
        "model_id": request.model_id,
        "similarity": result.similarity,
        "opposite_meaning": result.opposite_meaning,
        "percent": percent,
        "verdict": verdict,
        "message": verdict.describe(percent),
    }))
}

fn search(handles: &AppHandles, args: SearchArgs) -> Result<()> {
    let request = search_request(&handles.config.current(), args)?;
    let results = handles.client.search(&request)?;
    print_json(&results)
}

fn search_request(config: &PlaygroundConfig, args: SearchArgs) -> Result<SearchRequest> {
    let use_case = config.search_use_case(&args.use_case)?;

    let request = SearchRequest::new(
        args.query.unwrap_or_else(|| use_case.default_query.clone()),
        config.search_domain(&args.use_case),
    )
    .with_threshold(args.threshold.unwrap_or(use_case.threshold))
    .with_max_results(args.max_results)
    .with_tags(use_case.search_tags.iter().cloned());

    if request.query.trim().is_empty() {
        bail!("no query given and use case '{}' has no default query", args.use_case);
    }
    Ok(request)
}

fn library(handles: &AppHandles, args: LibraryArgs) -> Result<()> {
    let request = library_request(&handles.config.current(), &args)?;
    let entries = handles.client.list_library(&request)?;
    print_json(&entries)
}

fn library_request(config: &PlaygroundConfig, args: &LibraryArgs) -> Result<LibraryRequest> {
    let use_case = config.search_use_case(&args.use_case)?;

    let mut request = LibraryRequest::new(config.search_domain(&args.use_case))
        .with_tags(use_case.library_tags.iter().cloned());
    if !args.all {
        request = request.with_limit(args.limit);
    }
    if let Some(offset) = args.offset {
        request = request.with_offset(offset);
    }
    Ok(request)
}

fn clusters(handles: &AppHandles, args: ClusterArgs) -> Result<()> {
    let config = handles.config.current();
    let use_case = config.cluster_use_case(&args.use_case)?;
    let granularity = Granularity::from(args.granularity);

    match args.figure {
        Some(figure) => {
            let chart = handles
                .artifacts
                .load_figure(&use_case, granularity, figure.into())?;
            print_json(&chart)
        }
        None => {
            let overview = handles.artifacts.overview(&use_case, granularity)?;
            print_json(&json!({ "sorted_by": granularity.label(), "overview": overview }))
        }
    }
}

fn config(handles: &AppHandles, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => {
            let path = handles.config.path().to_path_buf();
            if path.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
            handles
                .config
                .save(PlaygroundConfig::default())
                .with_context(|| format!("failed to write {}", path.display()))?;
            print_json(&json!({ "written": path }))
        }
        ConfigCommand::Show => {
            let mut config = handles.config.current();
            if config.service.api_key.is_some() {
                config.service.api_key = Some("***".into());
            }
            print_json(&config)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
