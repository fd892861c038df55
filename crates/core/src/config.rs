//! Configuration management for tenrag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (.tenrag/config.yaml, or the path in `TENRAG_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .tenrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Request builder bounds
    pub retrieval: RetrievalConfig,

    /// Backend connection settings
    pub transport: TransportConfig,
}

/// Bounds applied by the request builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    /// Metadata key that carries the tenant identifier in the backend
    pub tenant_key: String,

    /// Result count used when the caller gives none, zero, or a negative value
    pub default_result_count: u32,

    /// Upper bound on the result count
    pub max_result_count: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            tenant_key: "tenantId".to_string(),
            default_result_count: 5,
            max_result_count: 100,
        }
    }
}

impl RetrievalConfig {
    /// Check the bounds are usable.
    pub fn validate(&self) -> AppResult<()> {
        if self.tenant_key.trim().is_empty() {
            return Err(AppError::Config("tenantKey must not be blank".to_string()));
        }

        if self.default_result_count == 0 {
            return Err(AppError::Config(
                "defaultResultCount must be at least 1".to_string(),
            ));
        }

        if self.max_result_count < self.default_result_count {
            return Err(AppError::Config(format!(
                "maxResultCount ({}) must not be below defaultResultCount ({})",
                self.max_result_count, self.default_result_count
            )));
        }

        Ok(())
    }
}

/// Connection settings for the retrieval backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportConfig {
    /// Transport implementation ("http" or "mock")
    pub provider: String,

    /// Base URL of the knowledge-base runtime API.
    ///
    /// Requests carry at most a bearer token, so a hosted runtime that needs
    /// request signing must be reached through a signing proxy. Empty by
    /// default; the http provider refuses to start without one.
    pub endpoint: String,

    /// Identifier of the shared knowledge base
    pub knowledge_base_id: String,

    /// Generation model; when set, `query --generate` uses retrieve-and-generate
    pub model_arn: Option<String>,

    /// Name of the environment variable holding a bearer token
    pub api_key_env: Option<String>,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt for retryable failures
    pub max_retries: u32,

    /// Base delay for exponential backoff, in milliseconds
    pub retry_backoff_ms: u64,

    /// JSON file holding the corpus served by the mock provider
    pub mock_corpus: Option<PathBuf>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            endpoint: String::new(),
            knowledge_base_id: String::new(),
            model_arn: None,
            api_key_env: None,
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 200,
            mock_corpus: None,
        }
    }
}

impl TransportConfig {
    /// Resolve the bearer token from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|env_var| std::env::var(env_var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Check the settings required by the selected provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["http", "mock"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown transport provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.provider == "http" {
            if self.endpoint.trim().is_empty() {
                return Err(AppError::Config(
                    "Transport endpoint must be set for the http provider".to_string(),
                ));
            }

            if self.knowledge_base_id.trim().is_empty() {
                return Err(AppError::Config(
                    "knowledgeBaseId must be set for the http provider".to_string(),
                ));
            }

            if let Some(ref env_var) = self.api_key_env {
                if std::env::var(env_var).is_err() {
                    return Err(AppError::Config(format!(
                        "API key not found in environment variable: {}",
                        env_var
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    retrieval: Option<RetrievalConfig>,
    transport: Option<TransportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            retrieval: RetrievalConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `TENRAG_WORKSPACE`: Override workspace path
    /// - `TENRAG_CONFIG`: Path to config file
    /// - `TENRAG_ENDPOINT`: Backend base URL
    /// - `TENRAG_KNOWLEDGE_BASE_ID`: Knowledge base identifier
    /// - `TENRAG_MODEL_ARN`: Generation model
    /// - `TENRAG_MOCK_CORPUS`: Corpus file for the mock provider
    /// - `TENRAG_TENANT_KEY`: Metadata key carrying the tenant id
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use tenrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Tenant key: {}", config.retrieval.tenant_key);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, letting explicit paths win over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("TENRAG_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("TENRAG_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.tenrag_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(endpoint) = std::env::var("TENRAG_ENDPOINT") {
            config.transport.endpoint = endpoint;
        }

        if let Ok(kb_id) = std::env::var("TENRAG_KNOWLEDGE_BASE_ID") {
            config.transport.knowledge_base_id = kb_id;
        }

        if let Ok(model_arn) = std::env::var("TENRAG_MODEL_ARN") {
            config.transport.model_arn = Some(model_arn);
        }

        if let Some(corpus) = env_path("TENRAG_MOCK_CORPUS") {
            config.transport.mock_corpus = Some(corpus);
        }

        if let Ok(tenant_key) = std::env::var("TENRAG_TENANT_KEY") {
            config.retrieval.tenant_key = tenant_key;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        Ok(self.merge_file(config_file))
    }

    fn merge_file(&self, config_file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(transport) = config_file.transport {
            result.transport = transport;
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        knowledge_base_id: Option<String>,
        provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            self.transport.endpoint = endpoint;
        }

        if let Some(kb_id) = knowledge_base_id {
            self.transport.knowledge_base_id = kb_id;
        }

        if let Some(provider) = provider {
            self.transport.provider = provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .tenrag directory.
    pub fn tenrag_dir(&self) -> PathBuf {
        self.workspace.join(".tenrag")
    }

    /// Validate retrieval bounds and transport settings.
    pub fn validate(&self) -> AppResult<()> {
        self.retrieval.validate()?;
        self.transport.validate()
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.tenant_key, "tenantId");
        assert_eq!(config.retrieval.default_result_count, 5);
        assert_eq!(config.retrieval.max_result_count, 100);
        assert_eq!(config.transport.provider, "http");
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_tenrag_dir() {
        let config = AppConfig::default();
        assert!(config.tenrag_dir().ends_with(".tenrag"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("http://localhost:9000".to_string()),
            Some("KB123".to_string()),
            Some("mock".to_string()),
            None,
            true,
            false,
            true,
        );

        assert_eq!(config.transport.endpoint, "http://localhost:9000");
        assert_eq!(config.transport.knowledge_base_id, "KB123");
        assert_eq!(config.transport.provider, "mock");
        assert!(config.verbose);
        assert!(config.log_json);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
logging:
  level: warn
  color: false
retrieval:
  tenantKey: orgId
  maxResultCount: 20
transport:
  provider: mock
  knowledgeBaseId: KB42
  maxRetries: 5
  mockCorpus: fixtures/corpus.json
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();

        assert_eq!(config.log_level, Some("warn".to_string()));
        assert!(config.no_color);
        assert_eq!(config.retrieval.tenant_key, "orgId");
        assert_eq!(config.retrieval.max_result_count, 20);
        // Unset fields keep their defaults
        assert_eq!(config.retrieval.default_result_count, 5);
        assert_eq!(config.transport.provider, "mock");
        assert_eq!(config.transport.knowledge_base_id, "KB42");
        assert_eq!(config.transport.max_retries, 5);
        assert_eq!(config.transport.timeout_secs, 30);
        assert_eq!(
            config.transport.mock_corpus,
            Some(PathBuf::from("fixtures/corpus.json"))
        );
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "retrieval: [1, 2").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_retrieval_validate() {
        assert!(RetrievalConfig::default().validate().is_ok());

        let blank_key = RetrievalConfig {
            tenant_key: "  ".to_string(),
            ..Default::default()
        };
        assert!(blank_key.validate().is_err());

        let zero_default = RetrievalConfig {
            default_result_count: 0,
            ..Default::default()
        };
        assert!(zero_default.validate().is_err());

        let inverted = RetrievalConfig {
            default_result_count: 10,
            max_result_count: 3,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_transport_validate() {
        let unknown = TransportConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(unknown.validate().is_err());

        // http has no default endpoint
        match TransportConfig::default().validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("endpoint")),
            other => panic!("expected endpoint error, got {:?}", other),
        }

        let no_kb = TransportConfig {
            endpoint: "http://localhost:8080".to_string(),
            ..Default::default()
        };
        assert!(no_kb.validate().is_err());

        let http = TransportConfig {
            endpoint: "http://localhost:8080".to_string(),
            knowledge_base_id: "KB1".to_string(),
            ..Default::default()
        };
        assert!(http.validate().is_ok());

        let mock = TransportConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        assert!(mock.validate().is_ok());
    }
}
