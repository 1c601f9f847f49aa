use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub roblox: RobloxConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Documents are kept in memory without one.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RobloxConfig {
    /// `.ROBLOSECURITY` cookie of the account that manages the groups.
    pub cookie: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub proxy_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Keep expired suspensions whose role could not be restored for the next
    /// sweep instead of dropping them.
    #[serde(default)]
    pub retain_failed_restores: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CronConfig {
    /// Bearer token required by `/cron/process-suspensions` when set.
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuditConfig {
    /// Discord webhook receiving the audit log.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> usize {
    16
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_interval_secs() -> u64 {
    60
}

const fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            retain_failed_restores: false,
        }
    }
}

impl Config {
    /// Loads `config/default.toml`, then `config/{BLOXMESH_ENV}.toml`, then
    /// `BLOXMESH__`-prefixed environment variables, later sources winning.
    ///
    /// # Errors
    ///
    /// Returns Err if a source is malformed or a required key is missing.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let env = std::env::var("BLOXMESH_ENV").unwrap_or_else(|_| "development".to_string());

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                ::config::Environment::with_prefix("BLOXMESH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        ::config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = parse("[roblox]\ncookie = \"abc\"\n");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.database.url.is_none());
        assert_eq!(config.roblox.timeout_secs, 10);
        assert!(config.sweeper.enabled);
        assert_eq!(config.sweeper.interval_secs, 60);
        assert!(!config.sweeper.retain_failed_restores);
        assert!(config.cron.secret.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            "[roblox]\ncookie = \"abc\"\ntimeout_secs = 3\n[sweeper]\ninterval_secs = 5\nretain_failed_restores = true\n[cron]\nsecret = \"s3cret\"\n",
        );
        assert_eq!(config.roblox.timeout_secs, 3);
        assert_eq!(config.sweeper.interval_secs, 5);
        assert!(config.sweeper.retain_failed_restores);
        assert_eq!(config.cron.secret.as_deref(), Some("s3cret"));
    }
}
