use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use crate::{client::DEFAULT_SQL_API_URL, ClientOptions};

/// Invalid value in the process environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Vendedor directory location and reload period.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VendedorSettings {
    pub path: PathBuf,
    pub ttl: Duration,
}

/// Service settings read from the environment.
///
/// Reads:
/// - `SQL_API_URL`: upstream base URL (default [`DEFAULT_SQL_API_URL`])
/// - `PORT`: listen port on `0.0.0.0` (default `3000`)
/// - `FETCH_TIMEOUT_MS`, `FETCH_MAX_RETRIES`, `FETCH_BACKOFF_MS`: see [`ClientOptions`]
/// - `VENDEDORES_PATH`: optional vendedor directory JSON file
/// - `VENDEDORES_TTL_SECS`: directory reload period (default `300`)
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub sql_api_url: String,
    pub listen_addr: SocketAddr,
    pub client: ClientOptions,
    pub vendedores: Option<VendedorSettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = ClientOptions::default();

        let sql_api_url = get("SQL_API_URL").unwrap_or_else(|| DEFAULT_SQL_API_URL.to_owned());
        let port: u16 = parse_or(get("PORT"), "PORT", 3000, "a port number")?;

        let client = ClientOptions {
            timeout_ms: parse_or(
                get("FETCH_TIMEOUT_MS"),
                "FETCH_TIMEOUT_MS",
                defaults.timeout_ms,
                "milliseconds",
            )?,
            max_retries: parse_or(
                get("FETCH_MAX_RETRIES"),
                "FETCH_MAX_RETRIES",
                defaults.max_retries,
                "a retry count",
            )?,
            retry_backoff_ms: parse_or(
                get("FETCH_BACKOFF_MS"),
                "FETCH_BACKOFF_MS",
                defaults.retry_backoff_ms,
                "milliseconds",
            )?,
        };

        let vendedores = match get("VENDEDORES_PATH") {
            Some(path) => {
                let ttl_secs: u64 = parse_or(
                    get("VENDEDORES_TTL_SECS"),
                    "VENDEDORES_TTL_SECS",
                    300,
                    "seconds",
                )?;
                Some(VendedorSettings {
                    path: PathBuf::from(path),
                    ttl: Duration::from_secs(ttl_secs),
                })
            }
            None => None,
        };

        Ok(Self {
            sql_api_url,
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            client,
            vendedores,
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
    }
}
