use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

use application::services::{ClientConfig, ResultCache, SemanticServiceClient};
use infrastructure::{ClusterArtifacts, HttpSemanticApi, MemoryResultCache, SledResultCache};
use interfaces::cli::Cli;
use settings::{CacheBackend, ConfigManager, PlaygroundConfig};

const ENV_LOG: &str = "PLAYGROUND_LOG";

/// Everything a front end needs to serve playground operations.
pub struct AppHandles {
    pub client: Arc<SemanticServiceClient>,
    pub config: Arc<ConfigManager>,
    pub artifacts: ClusterArtifacts,
    pub data_dir: PathBuf,
}

/// Knobs the caller can set before the environment is assembled.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOptions {
    pub data_dir: Option<PathBuf>,
    pub no_cache: bool,
}

/// Entry point invoked from `main.rs`.
pub fn run() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    interfaces::cli::execute(cli)
}

fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var(ENV_LOG).unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

pub fn build_environment(options: &EnvironmentOptions) -> Result<AppHandles> {
    let data_dir = match &options.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("failed to create data directory")?;
            dir.clone()
        }
        None => resolve_data_dir()?,
    };

    let config = Arc::new(ConfigManager::load(&data_dir).context("failed to load config file")?);
    let active_config = config.current();

    let api = HttpSemanticApi::new(
        &active_config.service.server_url,
        active_config.service.api_key.clone(),
        active_config.service.timeout(),
    );
    info!(
        target: "playground",
        server = api.base_url(),
        authenticated = active_config.service.api_key.is_some(),
        "connecting to semantic service"
    );

    let mut client = SemanticServiceClient::new(
        Arc::new(api),
        ClientConfig::new(active_config.service.domain_prefix.clone()),
    );
    if !options.no_cache {
        if let Some(cache) = init_cache(&active_config, &data_dir)? {
            client = client.with_cache(cache);
        }
    }

    let artifacts = init_artifacts(&active_config, &data_dir);

    Ok(AppHandles {
        client: Arc::new(client),
        config,
        artifacts,
        data_dir,
    })
}

fn init_cache(config: &PlaygroundConfig, data_dir: &Path) -> Result<Option<Arc<dyn ResultCache>>> {
    match config.cache.backend {
        CacheBackend::Disk => {
            let cache_dir = data_dir.join("cache");
            let cache = SledResultCache::open(&cache_dir)
                .map_err(|err| anyhow!(err.to_string()))
                .context("failed to open result cache")?;
            info!(
                target: "playground",
                path = %cache.data_dir().display(),
                entries = cache.len(),
                "result cache ready"
            );
            Ok(Some(Arc::new(cache)))
        }
        CacheBackend::Memory => Ok(Some(Arc::new(MemoryResultCache::new()))),
        CacheBackend::Off => Ok(None),
    }
}

fn init_artifacts(config: &PlaygroundConfig, data_dir: &Path) -> ClusterArtifacts {
    let root = if config.cluster.artifact_dir.is_absolute() {
        config.cluster.artifact_dir.clone()
    } else {
        data_dir.join(&config.cluster.artifact_dir)
    };
    ClusterArtifacts::new(root, config.cluster.topics_over_time.iter().cloned())
}

fn resolve_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", "playground", "SemanticPlayground")
        .ok_or_else(|| anyhow!("unable to determine OS data dir"))?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).context("failed to create data directory")?;
    Ok(dir)
}
