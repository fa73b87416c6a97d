use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dialog: DialogConfig,
    pub search: SearchConfig,
    pub records: RecordStoreConfig,
    pub notify: NotifyConfig,
    pub worker: WorkerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Slot-validation policy for the dialog front-end.
#[derive(Clone, Debug)]
pub struct DialogConfig {
    /// Cuisines the index was loaded with; the first entry doubles as the
    /// suggestion offered when a user asks for something else.
    pub cuisines: Vec<String>,
    /// The single location the service covers.
    pub location: String,
    /// Fixed UTC offset of the service timezone, used to derive "today"
    /// for the no-same-day-bookings rule.
    pub utc_offset_hours: i32,
}

impl DialogConfig {
    pub fn offers_cuisine(&self, cuisine: &str) -> bool {
        self.cuisines.iter().any(|known| known.eq_ignore_ascii_case(cuisine))
    }

    pub fn default_cuisine(&self) -> &str {
        self.cuisines.first().map(String::as_str).unwrap_or("italian")
    }
}

/// Search-index endpoint (Elasticsearch-compatible query API).
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub endpoint: String,
    pub index: String,
    pub doc_type: String,
    pub username: String,
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct RecordStoreConfig {
    pub endpoint: String,
    pub table: String,
}

#[derive(Clone, Debug)]
pub struct NotifyConfig {
    pub endpoint: String,
    pub api_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// How many candidate ids each recommendation pass requests.
    pub result_count: usize,
    pub shortfall_policy: ShortfallPolicy,
    pub poll_interval_secs: u64,
    /// How long a dequeued message stays invisible before it becomes
    /// redeliverable to another worker pass.
    pub visibility_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// What to do when the search index holds fewer matches than requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Fail the pass; no partial recommendation is sent.
    Error,
    /// Recommend whatever the index returned.
    Truncate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub cuisines: Option<Vec<String>>,
    pub location: Option<String>,
    pub search_endpoint: Option<String>,
    pub records_endpoint: Option<String>,
    pub notify_endpoint: Option<String>,
    pub result_count: Option<usize>,
    pub shortfall_policy: Option<ShortfallPolicy>,
    pub visibility_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://chowline.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            dialog: DialogConfig {
                cuisines: vec![
                    "italian".to_string(),
                    "chinese".to_string(),
                    "mexican".to_string(),
                    "thai".to_string(),
                    "japanese".to_string(),
                    "indian".to_string(),
                ],
                location: "boston".to_string(),
                // Requests are interpreted in US Eastern time.
                utc_offset_hours: -5,
            },
            search: SearchConfig {
                endpoint: "http://localhost:9200".to_string(),
                index: "restaurants".to_string(),
                doc_type: "Restaurant".to_string(),
                username: String::new(),
                password: String::new().into(),
            },
            records: RecordStoreConfig {
                endpoint: "http://localhost:8000".to_string(),
                table: "restaurants".to_string(),
            },
            notify: NotifyConfig { endpoint: "http://localhost:9300/send".to_string(), api_token: None },
            worker: WorkerConfig {
                result_count: 3,
                shortfall_policy: ShortfallPolicy::Error,
                poll_interval_secs: 5,
                visibility_timeout_secs: 60,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for ShortfallPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "truncate" => Ok(Self::Truncate),
            other => Err(ConfigError::Validation(format!(
                "unsupported shortfall policy `{other}` (expected error|truncate)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("chowline.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(dialog) = patch.dialog {
            if let Some(cuisines) = dialog.cuisines {
                self.dialog.cuisines = cuisines;
            }
            if let Some(location) = dialog.location {
                self.dialog.location = location;
            }
            if let Some(utc_offset_hours) = dialog.utc_offset_hours {
                self.dialog.utc_offset_hours = utc_offset_hours;
            }
        }

        if let Some(search) = patch.search {
            if let Some(endpoint) = search.endpoint {
                self.search.endpoint = endpoint;
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
            if let Some(doc_type) = search.doc_type {
                self.search.doc_type = doc_type;
            }
            if let Some(username) = search.username {
                self.search.username = username;
            }
            if let Some(search_password_value) = search.password {
                self.search.password = search_password_value.into();
            }
        }

        if let Some(records) = patch.records {
            if let Some(endpoint) = records.endpoint {
                self.records.endpoint = endpoint;
            }
            if let Some(table) = records.table {
                self.records.table = table;
            }
        }

        if let Some(notify) = patch.notify {
            if let Some(endpoint) = notify.endpoint {
                self.notify.endpoint = endpoint;
            }
            if let Some(notify_token_value) = notify.api_token {
                self.notify.api_token = Some(notify_token_value.into());
            }
        }

        if let Some(worker) = patch.worker {
            if let Some(result_count) = worker.result_count {
                self.worker.result_count = result_count;
            }
            if let Some(shortfall_policy) = worker.shortfall_policy {
                self.worker.shortfall_policy = shortfall_policy;
            }
            if let Some(poll_interval_secs) = worker.poll_interval_secs {
                self.worker.poll_interval_secs = poll_interval_secs;
            }
            if let Some(visibility_timeout_secs) = worker.visibility_timeout_secs {
                self.worker.visibility_timeout_secs = visibility_timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("CHOWLINE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(level) = env::var("CHOWLINE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("CHOWLINE_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Ok(location) = env::var("CHOWLINE_LOCATION") {
            self.dialog.location = location;
        }
        if let Ok(cuisines) = env::var("CHOWLINE_CUISINES") {
            self.dialog.cuisines =
                cuisines.split(',').map(|entry| entry.trim().to_string()).collect();
        }
        if let Ok(endpoint) = env::var("CHOWLINE_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }
        if let Ok(username) = env::var("CHOWLINE_SEARCH_USERNAME") {
            self.search.username = username;
        }
        if let Ok(search_password_value) = env::var("CHOWLINE_SEARCH_PASSWORD") {
            self.search.password = search_password_value.into();
        }
        if let Ok(endpoint) = env::var("CHOWLINE_RECORDS_ENDPOINT") {
            self.records.endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("CHOWLINE_NOTIFY_ENDPOINT") {
            self.notify.endpoint = endpoint;
        }
        if let Ok(notify_token_value) = env::var("CHOWLINE_NOTIFY_TOKEN") {
            self.notify.api_token = Some(notify_token_value.into());
        }
        if let Ok(raw) = env::var("CHOWLINE_RESULT_COUNT") {
            self.worker.result_count = raw.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride { key: "CHOWLINE_RESULT_COUNT".to_string(), value: raw }
            })?;
        }
        if let Ok(raw) = env::var("CHOWLINE_SHORTFALL_POLICY") {
            self.worker.shortfall_policy = raw.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(cuisines) = overrides.cuisines {
            self.dialog.cuisines = cuisines;
        }
        if let Some(location) = overrides.location {
            self.dialog.location = location;
        }
        if let Some(endpoint) = overrides.search_endpoint {
            self.search.endpoint = endpoint;
        }
        if let Some(endpoint) = overrides.records_endpoint {
            self.records.endpoint = endpoint;
        }
        if let Some(endpoint) = overrides.notify_endpoint {
            self.notify.endpoint = endpoint;
        }
        if let Some(result_count) = overrides.result_count {
            self.worker.result_count = result_count;
        }
        if let Some(shortfall_policy) = overrides.shortfall_policy {
            self.worker.shortfall_policy = shortfall_policy;
        }
        if let Some(visibility_timeout_secs) = overrides.visibility_timeout_secs {
            self.worker.visibility_timeout_secs = visibility_timeout_secs;
        }
        if let Some(poll_interval_secs) = overrides.poll_interval_secs {
            self.worker.poll_interval_secs = poll_interval_secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.dialog.cuisines.is_empty() {
            return Err(ConfigError::Validation(
                "dialog.cuisines must list at least one cuisine".to_string(),
            ));
        }
        if self.dialog.location.trim().is_empty() {
            return Err(ConfigError::Validation("dialog.location must not be empty".to_string()));
        }
        if !(-14..=14).contains(&self.dialog.utc_offset_hours) {
            return Err(ConfigError::Validation(format!(
                "dialog.utc_offset_hours must lie in [-14, 14], got {}",
                self.dialog.utc_offset_hours
            )));
        }
        if self.worker.result_count == 0 {
            return Err(ConfigError::Validation(
                "worker.result_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let fallback = PathBuf::from("chowline.toml");
    fallback.exists().then_some(fallback)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    dialog: Option<DialogPatch>,
    search: Option<SearchPatch>,
    records: Option<RecordStorePatch>,
    notify: Option<NotifyPatch>,
    worker: Option<WorkerPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    cuisines: Option<Vec<String>>,
    location: Option<String>,
    utc_offset_hours: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    endpoint: Option<String>,
    index: Option<String>,
    doc_type: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordStorePatch {
    endpoint: Option<String>,
    table: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifyPatch {
    endpoint: Option<String>,
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkerPatch {
    result_count: Option<usize>,
    shortfall_policy: Option<ShortfallPolicy>,
    poll_interval_secs: Option<u64>,
    visibility_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
