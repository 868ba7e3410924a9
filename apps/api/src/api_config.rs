use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use hectara_core::AppError;
use tracing_subscriber::EnvFilter;

/// What the binary does after loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    Seed,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub permission_cache_ttl: Option<Duration>,
    pub seed_permission_catalog: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = match env::args().nth(1).as_deref() {
            None | Some("serve") => ApiCommand::Serve,
            Some("migrate") => ApiCommand::Migrate,
            Some("seed") => ApiCommand::Seed,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "unknown command '{other}', expected 'serve', 'migrate' or 'seed'"
                )));
            }
        };

        let database_url = required_non_empty_env("DATABASE_URL")?;
        let database_max_connections = parsed_env("DATABASE_MAX_CONNECTIONS", 10_u32)?;
        let database_acquire_timeout =
            Duration::from_millis(parsed_env("DATABASE_ACQUIRE_TIMEOUT_MS", 2_000_u64)?);

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parsed_env("API_PORT", 3001_u16)?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        // Zero keeps cached resolutions until a grant replacement clears them.
        let permission_cache_ttl = match parsed_env("PERMISSION_CACHE_TTL_SECONDS", 0_u64)? {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        };

        let seed_permission_catalog = env::var("SEED_PERMISSION_CATALOG")
            .unwrap_or_else(|_| "true".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            command,
            database_url,
            database_max_connections,
            database_acquire_timeout,
            api_host,
            api_port,
            frontend_url,
            permission_cache_ttl,
            seed_permission_catalog,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parsed_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}
