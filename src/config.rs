use anyhow::Context;

/// Process configuration, read once at startup from the environment
/// (`.env` is loaded first when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    /// Interval of the campaign activation/expiry sweep.
    pub activation_sweep_secs: u64,
    /// Interval of the auto-generation check.
    pub generator_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            port: env_or("PORT", 3000)?,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            activation_sweep_secs: env_or("FLASH_SALE_SWEEP_SECS", 60)?,
            generator_sweep_secs: env_or("FLASH_SALE_GENERATOR_SECS", 3600)?,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {key}")),
        Err(_) => Ok(default),
    }
}
