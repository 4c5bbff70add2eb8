use gatekeep_core::config::{ConfigError, env_or, require_env};

/// Access service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AccessConfig {
    /// Database connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `ACCESS_PORT`.
    pub access_port: u16,
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            access_port: env_or("ACCESS_PORT", 3120),
        })
    }
}
