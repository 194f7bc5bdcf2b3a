use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{DomainError, ModelId};
use crate::infrastructure::http_client::DEFAULT_SERVER_URL;

/// Default filename used to persist configuration within the data directory.
const CONFIG_FILENAME: &str = "config.json";

pub const ENV_SERVER_URL: &str = "PLAYGROUND_SERVER_URL";
pub const ENV_API_KEY: &str = "PLAYGROUND_API_KEY";
pub const ENV_DOMAIN_PREFIX: &str = "PLAYGROUND_DOMAIN_PREFIX";

/// Connection to the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSettings {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Substring marking the domains that belong to the playground.
    #[serde(default)]
    pub domain_prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            api_key: None,
            domain_prefix: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where memoized results live.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CacheBackend {
    /// Persisted under `<data_dir>/cache`.
    #[default]
    Disk,
    Memory,
    Off,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheBackend,
}

/// Similarity model offered for comparisons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelChoice {
    pub label: String,
    pub id: ModelId,
}

impl ModelChoice {
    pub fn new(label: impl Into<String>, id: ModelId) -> Self {
        Self {
            label: label.into(),
            id,
        }
    }
}

/// Semantic compare page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareSettings {
    #[serde(default = "default_compare_domain")]
    pub domain: String,
    /// Offered models in display order; the first one is the default.
    #[serde(default)]
    pub models: Vec<ModelChoice>,
    #[serde(default = "default_inputs")]
    pub default_inputs: [String; 2],
}

impl CompareSettings {
    /// Resolves a model given either its label or its numeric id.
    pub fn resolve_model(&self, label_or_id: &str) -> Result<ModelId, DomainError> {
        if let Some(choice) = self.models.iter().find(|m| m.label == label_or_id) {
            return Ok(choice.id);
        }
        label_or_id.trim().parse::<ModelId>().map_err(|_| {
            DomainError::config(format!(
                "unknown model '{label_or_id}', expected one of: {}",
                self.models
                    .iter()
                    .map(|m| m.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }

    /// First configured model, used when the caller picks none.
    pub fn default_model(&self) -> Option<(&str, ModelId)> {
        self.models.first().map(|m| (m.label.as_str(), m.id))
    }
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            domain: default_compare_domain(),
            models: Vec::new(),
            default_inputs: default_inputs(),
        }
    }
}

/// One searchable library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchUseCase {
    #[serde(default)]
    pub default_query: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub search_tags: Vec<String>,
    #[serde(default)]
    pub library_tags: Vec<String>,
}

/// Semantic search page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchSettings {
    #[serde(default)]
    pub use_cases: BTreeMap<String, SearchUseCase>,
}

/// Smart cluster page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterSettings {
    /// Root of the pre-computed artifacts. Relative paths resolve against the data directory.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Display label to artifact directory.
    #[serde(default)]
    pub use_cases: BTreeMap<String, String>,
    /// Artifact directories that also carry a topics-over-time chart.
    #[serde(default)]
    pub topics_over_time: Vec<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            use_cases: BTreeMap::new(),
            topics_over_time: Vec::new(),
        }
    }
}

/// Complete persisted configuration payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaygroundConfig {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub compare: CompareSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub cluster: ClusterSettings,
}

impl PlaygroundConfig {
    /// Remote domain backing a search use case.
    pub fn search_domain(&self, use_case: &str) -> String {
        format!("{}{}", self.service.domain_prefix, use_case)
    }

    pub fn search_use_case(&self, use_case: &str) -> Result<&SearchUseCase, DomainError> {
        self.search.use_cases.get(use_case).ok_or_else(|| {
            DomainError::config(format!(
                "unknown search use case '{use_case}', expected one of: {}",
                self.search.use_cases.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Artifact directory for a cluster use case given by label or directory name.
    pub fn cluster_use_case(&self, use_case: &str) -> Result<String, DomainError> {
        if let Some(dir) = self.cluster.use_cases.get(use_case) {
            return Ok(dir.clone());
        }
        if self.cluster.use_cases.values().any(|dir| dir == use_case) {
            return Ok(use_case.to_string());
        }
        Err(DomainError::config(format!(
            "unknown cluster use case '{use_case}'"
        )))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SERVER_URL) {
            self.service.server_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.service.api_key = Some(key);
        }
        if let Some(prefix) = lookup(ENV_DOMAIN_PREFIX) {
            self.service.domain_prefix = prefix;
        }
    }
}

/// Thread-safe manager responsible for loading and persisting `PlaygroundConfig`.
pub struct ConfigManager {
    path: PathBuf,
    state: RwLock<PlaygroundConfig>,
}

impl ConfigManager {
    /// Create a manager rooted at `data_dir`. The JSON file will be located at
    /// `<data_dir>/config.json`. A missing, unreadable or invalid file yields
    /// defaults (the latter two with a warning); environment overrides are
    /// applied on top.
    pub fn load(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::load_with(data_dir, |name| std::env::var(name).ok())
    }

    fn load_with(
        data_dir: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::io::Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILENAME);
        let mut config = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<PlaygroundConfig>(&bytes).unwrap_or_else(|err| {
                warn!(
                    target: "playground::settings",
                    path = %path.display(),
                    error = %err,
                    "invalid config file, falling back to defaults"
                );
                PlaygroundConfig::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PlaygroundConfig::default(),
            Err(err) => {
                warn!(
                    target: "playground::settings",
                    path = %path.display(),
                    error = %err,
                    "unreadable config file, falling back to defaults"
                );
                PlaygroundConfig::default()
            }
        };
        config.apply_env(lookup);

        Ok(Self {
            path,
            state: RwLock::new(config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> PlaygroundConfig {
        self.state.read().clone()
    }

    /// Replace the configuration and persist it to disk.
    pub fn save(&self, config: PlaygroundConfig) -> std::io::Result<PlaygroundConfig> {
        {
            let mut guard = self.state.write();
            *guard = config;
            self.persist_locked(&guard)?;
        }
        Ok(self.current())
    }

    /// Ensure the backing directory exists and write the JSON payload.
    fn persist_locked(&self, config: &PlaygroundConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(config)?;
        fs::write(&self.path, payload)
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_compare_domain() -> String {
    "PG_Compare".to_string()
}

fn default_inputs() -> [String; 2] {
    [
        "I like to eat apples.".to_string(),
        "I like to eat bananas.".to_string(),
    ]
}

const fn default_threshold() -> f64 {
    0.75
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("magicsort")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tempfile::tempdir;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::load_with(dir.path(), no_env).unwrap();
        let config = manager.current();

        assert_eq!(config, PlaygroundConfig::default());
        assert_eq!(config.service.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.cache.backend, CacheBackend::Disk);
        assert_eq!(config.compare.domain, "PG_Compare");
        assert_eq!(config.compare.default_inputs[0], "I like to eat apples.");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::load_with(dir.path(), no_env).unwrap();

        let mut config = manager.current();
        config.service.domain_prefix = "PG_".into();
        config.compare.models.push(ModelChoice::new("Fast", 19));
        config.search.use_cases.insert(
            "News".into(),
            SearchUseCase {
                default_query: "elections".into(),
                threshold: 0.6,
                search_tags: vec!["news".into()],
                library_tags: vec!["library".into()],
            },
        );
        manager.save(config.clone()).unwrap();

        let reloaded = ConfigManager::load_with(dir.path(), no_env).unwrap();
        assert_eq!(reloaded.current(), config);
        assert_eq!(reloaded.current().search_domain("News"), "PG_News");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "service": { "domain_prefix": "PG_" }, "cache": { "backend": "memory" } }"#,
        )
        .unwrap();

        let config = ConfigManager::load_with(dir.path(), no_env)
            .unwrap()
            .current();
        assert_eq!(config.service.domain_prefix, "PG_");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::load_with(dir.path(), |name| match name {
            ENV_SERVER_URL => Some("https://semantic.example".into()),
            ENV_API_KEY => Some("secret".into()),
            _ => None,
        })
        .unwrap();

        let config = manager.current();
        assert_eq!(config.service.server_url, "https://semantic.example");
        assert_eq!(config.service.api_key.as_deref(), Some("secret"));
        assert_eq!(config.service.domain_prefix, "");
    }

    #[test]
    fn test_resolve_model_by_label_or_id() {
        let mut compare = CompareSettings::default();
        compare.models.push(ModelChoice::new("Fast", 19));
        compare.models.push(ModelChoice::new("Accurate", 27));

        assert_eq!(compare.resolve_model("Fast").unwrap(), 19);
        assert_eq!(compare.resolve_model("31").unwrap(), 31);
        assert!(matches!(
            compare.resolve_model("Slow"),
            Err(DomainError::Config(_))
        ));
        assert_eq!(compare.default_model(), Some(("Fast", 19)));
    }

    #[test]
    fn test_models_keep_file_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "compare": { "models": [
                { "label": "Multilingual", "id": 31 },
                { "label": "Accurate", "id": 27 }
            ] } }"#,
        )
        .unwrap();

        let config = ConfigManager::load_with(dir.path(), no_env)
            .unwrap()
            .current();
        assert_eq!(config.compare.default_model(), Some(("Multilingual", 31)));
        assert_eq!(config.compare.resolve_model("Accurate").unwrap(), 27);
    }

    #[test]
    fn test_invalid_file_warns_and_yields_defaults() {
        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for Captured {
            type Writer = Captured;

            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "service": { "api_key": "secret", }"#,
        )
        .unwrap();

        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        let config = tracing::subscriber::with_default(subscriber, || {
            ConfigManager::load_with(dir.path(), no_env)
                .unwrap()
                .current()
        });

        assert_eq!(config, PlaygroundConfig::default());
        let logs = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(logs.contains("invalid config file"), "logs: {logs}");
        assert!(logs.contains(CONFIG_FILENAME), "logs: {logs}");
    }

    #[test]
    fn test_cluster_use_case_by_label_or_dir() {
        let mut config = PlaygroundConfig::default();
        config
            .cluster
            .use_cases
            .insert("News articles".into(), "news".into());

        assert_eq!(config.cluster_use_case("News articles").unwrap(), "news");
        assert_eq!(config.cluster_use_case("news").unwrap(), "news");
        assert!(config.cluster_use_case("recipes").is_err());
    }
}
