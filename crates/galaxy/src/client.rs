//! Galaxy REST API client.
//!
//! Async HTTP client using `reqwest` with API key authentication.

use std::time::Duration;

use gxupload_protocol::constants::{
    FETCH_ENDPOINT, HEADER_API_KEY, HEADER_TUS_RESUMABLE, HISTORIES_ENDPOINT, TUS_ENDPOINT,
};
use gxupload_protocol::{FetchRequest, HistorySummary, TUS_VERSION};
use gxupload_upload::TransportError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the Galaxy client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API key")]
    InvalidKey,

    #[error("invalid Galaxy URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<Error> for TransportError {
    fn from(err: Error) -> Self {
        match err {
            Error::Api { status, body } => TransportError::from_status(status, body),
            Error::Http(e) => TransportError::Network(e.to_string()),
            Error::Json(e) => TransportError::Protocol(format!("invalid response body: {e}")),
            Error::InvalidKey | Error::InvalidUrl { .. } => TransportError::Protocol(err.to_string()),
        }
    }
}

/// Galaxy API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GalaxyClient {
    http: reqwest::Client,
    base_url: String,
}

impl GalaxyClient {
    /// Creates a client for the server at `url` authenticating with `api_key`.
    ///
    /// Every request carries the key and the TUS version header.
    pub fn new(url: &str, api_key: &str) -> Result<Self, Error> {
        reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HEADER_API_KEY),
            HeaderValue::from_str(api_key).map_err(|_| Error::InvalidKey)?,
        );
        headers.insert(
            HeaderName::from_static(HEADER_TUS_RESUMABLE),
            HeaderValue::from_static(TUS_VERSION),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL of an API path.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL of the TUS upload endpoint.
    pub fn tus_endpoint(&self) -> String {
        self.endpoint(TUS_ENDPOINT)
    }

    /// Lists the histories owned by the current user.
    pub async fn list_histories(&self) -> Result<Vec<HistorySummary>, Error> {
        let resp = self
            .http
            .get(self.endpoint(HISTORIES_ENDPOINT))
            .send()
            .await?;
        let body = check(resp).await?.bytes().await?;
        let histories: Vec<HistorySummary> = serde_json::from_slice(&body)?;
        debug!(count = histories.len(), "listed histories");
        Ok(histories)
    }

    /// Runs the fetch tool, turning an upload session into a dataset.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<serde_json::Value, Error> {
        let resp = self
            .http
            .post(self.endpoint(FETCH_ENDPOINT))
            .json(request)
            .send()
            .await?;
        let body = check(resp).await?.bytes().await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Turns a non-success response into [`Error::Api`].
pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}
