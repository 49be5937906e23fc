//! Remote fetching of the published key set
//!
//! The key source is the only I/O boundary of the crate. It is driven by a
//! [`Fetcher`]: either the built-in `reqwest` fetcher or a user-supplied
//! function returning the raw response body.

use crate::error::{Error, Result};
use crate::jwks::JwkSet;
use crate::options::ClientOptions;
use miniserde::Deserialize;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Boxed future returned by a [`Fetcher`]
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'static>>;

/// HTTP fetch function for the JWKS document
///
/// Accepts the JWKS URI and yields the response body. Implementations report
/// network failures as [`Error::Transport`] and failures the endpoint itself
/// reported as [`Error::Jwks`].
///
/// Error messages should follow the pattern: `"component: error description"`
/// (e.g., `"network: connection failed"`, `"http: status 404"`).
pub type Fetcher = Arc<dyn Fn(String) -> FetchFuture + Send + Sync>;

/// Error document some endpoints return with a non-success status
#[derive(Deserialize)]
struct UpstreamError {
    message: Option<String>,
}

/// Build the default `reqwest` fetcher
pub(crate) fn reqwest_fetcher(client: reqwest::Client, headers: HeaderMap) -> Fetcher {
    Arc::new(move |url: String| {
        let client = client.clone();
        let headers = headers.clone();
        Box::pin(async move {
            let response = client
                .get(&url)
                .headers(headers)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| Error::Transport(format!("network: {e}")))?;

            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(format!("network: {e}")))?
                .to_vec();

            if !status.is_success() {
                return Err(Error::Jwks(upstream_message(status, &bytes)));
            }

            Ok(bytes)
        })
    })
}

/// Message reported by the endpoint, or the status line when it sent none
fn upstream_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    std::str::from_utf8(body)
        .ok()
        .and_then(|body| miniserde::json::from_str::<UpstreamError>(body).ok())
        .and_then(|err| err.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("http: status {status}"))
}

/// Convert configured request headers into a header map
pub(crate) fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            Error::ConfigurationInvalid(format!("invalid request header name '{name}': {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            Error::ConfigurationInvalid(format!("invalid value for request header '{name}': {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Remote key source bound to one JWKS URI
pub(crate) struct KeySource {
    uri: String,
    fetcher: Fetcher,
    timeout: Duration,
}

impl KeySource {
    /// Create the key source described by the client options
    ///
    /// A custom fetcher takes precedence over the request agent and headers.
    pub(crate) fn new(options: &ClientOptions) -> Result<Self> {
        let fetcher = match &options.fetcher {
            Some(fetcher) => fetcher.clone(),
            None => {
                let client = match &options.request_agent {
                    Some(agent) => agent.clone(),
                    None => reqwest::Client::builder()
                        .timeout(options.timeout)
                        .build()
                        .map_err(|e| {
                            Error::ConfigurationInvalid(format!("failed to build http client: {e}"))
                        })?,
                };
                reqwest_fetcher(client, header_map(&options.request_headers)?)
            }
        };

        Ok(Self {
            uri: options.jwks_uri.clone(),
            fetcher,
            timeout: options.timeout,
        })
    }

    pub(crate) fn uri(&self) -> &str {
        &self.uri
    }

    /// Fetch and parse the key set
    ///
    /// The timeout bounds the whole fetch, whichever fetcher is in use.
    pub(crate) async fn fetch(&self) -> Result<JwkSet> {
        let body = tokio::time::timeout(self.timeout, (self.fetcher)(self.uri.clone()))
            .await
            .map_err(|_| {
                Error::Transport(format!(
                    "network: request timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;

        JwkSet::from_slice(&body)
    }
}
