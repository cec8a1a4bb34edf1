use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default origin for records, documents, configurations and jobs.
pub const DEFAULT_BASE_URL: &str = "https://clients-copilot.nebuia.com";
/// Default origin for embedding status checks.
pub const DEFAULT_EMBEDDINGS_URL: &str = "https://embeddings-distributor.nebuia.com";
/// Default timeout for metadata calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// Default timeout for uploads and type verification.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(900);
/// Default file sink for rendered curl commands.
pub const DEFAULT_CURL_LOG_FILE: &str = "nebuia_curl_commands.log";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Static credentials sent with every request.
#[derive(Clone)]
pub struct Credentials {
    /// Client identifier used in every API path.
    pub client_id: String,
    /// Value of the `X-API-Key` header.
    pub api_key: String,
    /// Value of the `X-API-Secret` header.
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

/// Settings for the curl diagnostic side-channel.
#[derive(Debug, Clone)]
pub struct CurlLogSettings {
    /// Whether commands are rendered at all.
    pub enabled: bool,
    /// Optional file the commands are appended to.
    pub file: Option<PathBuf>,
    /// Whether commands are echoed to stderr.
    pub console: bool,
}

impl Default for CurlLogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file: Some(PathBuf::from(DEFAULT_CURL_LOG_FILE)),
            console: false,
        }
    }
}

impl CurlLogSettings {
    /// Settings with the side-channel switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            file: None,
            console: false,
        }
    }
}

/// Runtime configuration for the Nebuia client.
#[derive(Debug, Clone)]
pub struct Config {
    /// API credentials.
    pub credentials: Credentials,
    /// Origin of the main API.
    pub base_url: String,
    /// Origin of the embeddings distributor.
    pub embeddings_url: String,
    /// Timeout applied to metadata calls.
    pub timeout: Duration,
    /// Timeout applied to uploads and type verification.
    pub upload_timeout: Duration,
    /// Curl side-channel settings.
    pub curl_log: CurlLogSettings,
}

impl Config {
    /// Build a configuration with default origins and timeouts.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            embeddings_url: DEFAULT_EMBEDDINGS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            curl_log: CurlLogSettings::default(),
        }
    }

    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credentials = Credentials {
            client_id: load_env("NEBUIA_CLIENT_ID")?,
            api_key: load_env("NEBUIA_API_KEY")?,
            api_secret: load_env("NEBUIA_API_SECRET")?,
        };

        let curl_file = match env::var("NEBUIA_CURL_LOG_FILE") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(PathBuf::from(value)),
            Err(_) => Some(PathBuf::from(DEFAULT_CURL_LOG_FILE)),
        };

        Ok(Self {
            credentials,
            base_url: load_env_optional("NEBUIA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            embeddings_url: load_env_optional("NEBUIA_EMBEDDINGS_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDINGS_URL.to_string()),
            timeout: load_seconds("NEBUIA_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT),
            upload_timeout: load_seconds("NEBUIA_UPLOAD_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
            curl_log: CurlLogSettings {
                enabled: load_flag("NEBUIA_CURL_LOG")?.unwrap_or(true),
                file: curl_file,
                console: load_flag("NEBUIA_CURL_LOG_CONSOLE")?.unwrap_or(false),
            },
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_seconds(key: &str) -> Result<Option<Duration>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn load_flag(key: &str) -> Result<Option<bool>, ConfigError> {
    load_env_optional(key)
        .map(|value| parse_flag(&value).ok_or_else(|| ConfigError::InvalidValue(key.to_string())))
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load `.env` (when present) and read the configuration from the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        base_url = %config.base_url,
        embeddings_url = %config.embeddings_url,
        client_id = %config.credentials.client_id,
        timeout = config.timeout.as_secs(),
        upload_timeout = config.upload_timeout.as_secs(),
        curl_log = config.curl_log.enabled,
        "Loaded configuration"
    );
    Ok(config)
}
