use std::fmt;

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Url,
};

use crate::{
    fetch::{fetch_with_retry, LookupRequest},
    ClientOptions, LookupError, Result, Sucursal,
};

/// Base URL used when `SQL_API_URL` is not set.
pub const DEFAULT_SQL_API_URL: &str = "http://localhost:3001";

/// Builds the `app-search` URL for one cliente id.
///
/// Example: `("http://api/", "60 62")` → `"http://api/clientes/app-search?id=60+62"`
pub fn app_search_url(base_url: &str, cliente_id: &str) -> Result<Url> {
    let raw = format!("{}/clientes/app-search", base_url.trim().trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|err| LookupError::InvalidUrl {
        url: raw.clone(),
        message: err.to_string(),
    })?;
    url.query_pairs_mut().append_pair("id", cliente_id);
    Ok(url)
}

#[derive(Clone)]
/// HTTP client for the SQL API `clientes` endpoints.
pub struct SqlApiClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
}

impl fmt::Debug for SqlApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlApiClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

impl SqlApiClient {
    /// Creates a client for the SQL API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            options: ClientOptions::default(),
        }
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// `app-search` URL of this client for `cliente_id`.
    pub fn search_url(&self, cliente_id: &str) -> Result<Url> {
        app_search_url(&self.base_url, cliente_id)
    }

    /// Fetches every sucursal the SQL API knows for `cliente_id`.
    ///
    /// Transport failures and 5xx are retried by [`fetch_with_retry`]; a 4xx
    /// fails straight away with [`LookupError::Http`].
    pub async fn search_sucursales(&self, cliente_id: &str) -> Result<Vec<Sucursal>> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let request = LookupRequest::get(self.search_url(cliente_id)?).with_headers(headers);
        let response = fetch_with_retry(&self.http, &request, &self.options).await?;

        let status = response.status();
        let body = response.text().await.map_err(LookupError::Transport)?;

        if !status.is_success() {
            return Err(LookupError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<Vec<Sucursal>>(&body).map_err(|err| {
            LookupError::Decode(format!("invalid app-search response JSON: {err}; body: {body}"))
        })
    }
}
