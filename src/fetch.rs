use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::time::sleep;

use crate::{ClientOptions, LookupError, Result};

/// Outbound GET description: target URL plus optional extra headers.
#[derive(Clone, Debug)]
pub struct LookupRequest {
    pub url: reqwest::Url,
    pub headers: HeaderMap,
}

impl LookupRequest {
    pub fn get(url: reqwest::Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Remaining retry budget and the delay to wait before the next retry.
///
/// Lives for one [`fetch_with_retry`] call only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct RetryState {
    remaining: usize,
    delay: Duration,
}

impl RetryState {
    pub(crate) fn new(options: &ClientOptions) -> Self {
        Self {
            remaining: options.max_retries,
            delay: Duration::from_millis(options.retry_backoff_ms),
        }
    }

    /// Consumes one retry and returns how long to wait before it, or `None`
    /// when the budget is spent.
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.delay;
        self.delay = self.delay.saturating_mul(2);
        Some(delay)
    }
}

/// Issues a GET and retries transport failures, timeouts and 5xx responses
/// with exponential backoff.
///
/// Any response below 500, 4xx included, is returned as-is on the first
/// attempt that produces it. Once the budget is spent the last failure is
/// returned: [`LookupError::Transport`] for errors raised by `reqwest`
/// (timeouts included) or [`LookupError::Http`] for a 5xx.
pub async fn fetch_with_retry(
    http: &reqwest::Client,
    request: &LookupRequest,
    options: &ClientOptions,
) -> Result<reqwest::Response> {
    let mut retry = RetryState::new(options);
    let mut attempt = 1usize;

    loop {
        let response = http
            .get(request.url.clone())
            .headers(request.headers.clone())
            .timeout(Duration::from_millis(options.timeout_ms))
            .send()
            .await;

        let failure = match response {
            Ok(response) if !response.status().is_server_error() => return Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(err) => {
                        tracing::debug!(status, error = %err, "could not read error body");
                        String::new()
                    }
                };
                LookupError::Http { status, body }
            }
            Err(err) => LookupError::Transport(err),
        };

        let Some(delay) = retry.next_delay() else {
            return Err(failure);
        };

        tracing::warn!(
            url = %request.url,
            attempt,
            ?delay,
            error = %failure,
            "upstream request failed, retrying"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
