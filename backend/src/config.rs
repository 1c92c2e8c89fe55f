use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// SQL advisor settings (external soar binary and the account it connects with)
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Path of the soar executable
    pub soar_bin: String,
    /// Path of the soar yaml config passed via `-config`
    pub soar_config: String,
    /// Account used to build the online DSN of the analysis target
    pub db_user: String,
    pub db_pass: String,
    /// Deadline for one whole advise call (default: 60s)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Password stays out of Debug output
impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("soar_bin", &self.soar_bin)
            .field("soar_config", &self.soar_config)
            .field("db_user", &self.db_user)
            .field("db_pass", &"******")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the explicit path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(explicit_path: Option<&str>) -> Result<Self, anyhow::Error> {
        let path = match explicit_path {
            Some(path) => Some(path.to_string()),
            None => Self::find_config_file(),
        };

        let mut config = if let Some(config_path) = path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_DATABASE_URL
    /// - APP_LOG_LEVEL (e.g., "info,db_autonomy=debug")
    /// - APP_ADVISOR_SOAR_BIN / APP_ADVISOR_SOAR_CONFIG
    /// - APP_ADVISOR_DB_USER / APP_ADVISOR_DB_PASS
    /// - APP_ADVISOR_TIMEOUT (accepts "30", "30s", "5m", "1h")
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(db_url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(bin) = std::env::var("APP_ADVISOR_SOAR_BIN") {
            self.advisor.soar_bin = bin;
            tracing::info!("Override advisor.soar_bin from env: {}", self.advisor.soar_bin);
        }

        if let Ok(file) = std::env::var("APP_ADVISOR_SOAR_CONFIG") {
            self.advisor.soar_config = file;
            tracing::info!("Override advisor.soar_config from env: {}", self.advisor.soar_config);
        }

        if let Ok(user) = std::env::var("APP_ADVISOR_DB_USER") {
            self.advisor.db_user = user;
            tracing::info!("Override advisor.db_user from env");
        }

        if let Ok(pass) = std::env::var("APP_ADVISOR_DB_PASS") {
            self.advisor.db_pass = pass;
            tracing::info!("Override advisor.db_pass from env");
        }

        if let Ok(timeout) = std::env::var("APP_ADVISOR_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.advisor.timeout_secs = val;
                    tracing::info!(
                        "Override advisor.timeout_secs from env: {}",
                        self.advisor.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_ADVISOR_TIMEOUT '{}': {} (keep {})",
                    timeout,
                    e,
                    self.advisor.timeout_secs
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be > 0");
        }

        if self.advisor.soar_bin.is_empty() {
            anyhow::bail!("advisor.soar_bin cannot be empty");
        }
        if self.advisor.timeout_secs == 0 {
            anyhow::bail!("advisor.timeout_secs must be > 0");
        }
        if self.advisor.db_user.is_empty() {
            tracing::warn!("advisor.db_user is empty, soar will connect anonymously");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/db-autonomy.db".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,db_autonomy=debug".to_string(),
            file: Some("logs/db-autonomy.log".to_string()),
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            soar_bin: "/data/soar/bin/soar".to_string(),
            soar_config: "/data/soar/config/soar.yaml".to_string(),
            db_user: "root".to_string(),
            db_pass: "root".to_string(),
            timeout_secs: 60,
        }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Accepts either a number of seconds or a human-friendly string
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
