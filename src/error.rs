use std::error::Error as _;
use std::io;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Network, timeout or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Upstream answered with a status this crate does not accept.
    ///
    /// 5xx only surfaces here once the retry budget is spent; 4xx surfaces
    /// on the first attempt.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Upstream body is not the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Upstream base URL could not be combined into a request URL.
    #[error("invalid upstream url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    /// Vendedor directory file could not be read or parsed.
    #[error("vendedor directory '{path}': {message}")]
    Directory { path: String, message: String },
}

impl LookupError {
    /// Returns `true` when the upstream refused the TCP connection.
    ///
    /// Walks the whole `source()` chain since `reqwest` wraps the
    /// underlying `io::Error` several layers deep.
    pub fn is_connection_refused(&self) -> bool {
        let LookupError::Transport(err) = self else {
            return false;
        };
        if !err.is_connect() {
            return false;
        }

        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                if io_err.kind() == io::ErrorKind::ConnectionRefused {
                    return true;
                }
            }
            source = cause.source();
        }
        false
    }
}
