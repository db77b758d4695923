use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub proxy: ProxyConfig,
    pub command: CommandConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Administrator identity checked by the access gate. Loaded from
/// configuration rather than compiled in so tests can inject their own pair.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    pub passwords_file: String,
    pub reload_unit: String,  // unit reloaded after credential mutations
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    pub timeout_secs: u64,
    pub htpasswd_bin: String,
    pub systemctl_bin: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?;

        config.try_deserialize()
    }
}
