//! `cliente-lookup` resolves a cliente id to its sucursales, GPS coordinates
//! and vendedor contact.
//!
//! The data comes from the SQL API `/clientes/app-search` endpoint, reached
//! through a resilient GET:
//! - [`fetch_with_retry`]: per-attempt timeout, retries on transport errors
//!   and 5xx with exponential backoff
//! - [`SqlApiClient::search_sucursales`]: builds the URL and decodes records
//! - [`resolve_cliente`]: shapes records into a [`ClienteOutcome`]
//! - [`router`]: axum surface mapping outcomes and errors to HTTP answers

mod client;
mod config;
mod error;
mod fetch;
mod handler;
mod options;
mod resolve;
mod types;
mod vendedores;

pub use client::{app_search_url, SqlApiClient, DEFAULT_SQL_API_URL};
pub use config::{ConfigError, Settings, VendedorSettings};
pub use error::LookupError;
pub use fetch::{fetch_with_retry, LookupRequest};
pub use handler::{
    router, ApiError, AppState, CACHE_CONTROL_VALUE, INTERNAL_ERROR_MESSAGE, MISSING_ID_MESSAGE,
    NOT_FOUND_MESSAGE, SERVER_BUSY_MESSAGE,
};
pub use options::ClientOptions;
pub use resolve::resolve_cliente;
pub use types::{ClienteOutcome, ClienteSummary, Sucursal, Vendedor};
pub use vendedores::VendedorDirectory;

pub type Result<T> = std::result::Result<T, LookupError>;
