//! Remote-image relay.
//!
//! Fetches an absolute http(s) URL on behalf of a client that cannot read
//! cross-origin pixels, and streams the bytes back verbatim. Only `image/*`
//! responses are relayed, under a time limit and a size cap.

use crate::assets::is_image;
use crate::config::RelayConfig;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::stream;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Relay failure, mapped onto an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RelayError {
    /// No `url` query parameter.
    #[display("Missing url query parameter")]
    MissingUrl,

    /// Not an absolute http(s) URL.
    #[display("Invalid url (must be absolute http(s) URL)")]
    InvalidUrl,

    /// Upstream did not answer in time.
    #[display("Remote request timed out")]
    Timeout,

    /// Payload larger than the cap.
    #[display("Remote image exceeds {} bytes", _0)]
    TooLarge(u64),

    /// Upstream content type is not `image/*`.
    #[display("Remote resource is not an image")]
    NotAnImage,

    /// Upstream answered with an error status.
    #[display("Upstream returned status {}", _0)]
    UpstreamStatus(u16),

    /// Connection or protocol failure.
    #[display("Failed to fetch remote image")]
    FetchFailed,
}

impl std::error::Error for RelayError {}

impl RelayError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl => StatusCode::BAD_REQUEST,
            RelayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::NotAnImage => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::TooLarge(_) | RelayError::UpstreamStatus(_) | RelayError::FetchFailed => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::Timeout
        } else if let Some(status) = e.status() {
            RelayError::UpstreamStatus(status.as_u16())
        } else {
            RelayError::FetchFailed
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Validates the raw `url` query value.
pub fn validate_url(raw: Option<&str>) -> Result<Url, RelayError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return Err(RelayError::MissingUrl);
    };
    let url = Url::parse(raw).map_err(|_| RelayError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(RelayError::InvalidUrl),
    }
}

/// HTTP client plus the limits it enforces.
#[derive(Debug, Clone)]
pub struct ImageRelay {
    client: reqwest::Client,
    config: RelayConfig,
}

impl ImageRelay {
    /// Builds the upstream client (timeout, user agent, redirect policy).
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(*config.timeout_secs()))
            .user_agent(config.user_agent().clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client, config })
    }

    /// Relay limits.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Fetches `url` and checks status, content type and declared length.
    ///
    /// The body is not read yet.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<RelayedImage, RelayError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            let err = RelayError::from_reqwest(&e);
            warn!(error = %e, relay_error = %err, "Upstream fetch failed");
            err
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!(status = %status, "Upstream returned error status");
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image(&content_type) {
            warn!(content_type = %content_type, "Rejected non-image content type");
            return Err(RelayError::NotAnImage);
        }

        let max_bytes = *self.config.max_bytes();
        let content_length = response.content_length();
        if let Some(length) = content_length {
            if length > max_bytes {
                warn!(length, max_bytes, "Declared length exceeds cap");
                return Err(RelayError::TooLarge(max_bytes));
            }
        }

        debug!(content_type = %content_type, ?content_length, "Upstream accepted");
        Ok(RelayedImage {
            content_type,
            content_length,
            max_bytes,
            response,
        })
    }

    /// Validates, fetches and builds the streaming client response.
    #[instrument(skip(self))]
    pub async fn relay(&self, raw_url: Option<&str>) -> Result<Response, RelayError> {
        let url = validate_url(raw_url)?;
        let image = self.fetch(&url).await?;
        info!(url = %url, content_type = %image.content_type, "Relaying image");

        let headers = [
            (header::CONTENT_TYPE, image.content_type.clone()),
            (header::CACHE_CONTROL, self.config.cache_control()),
        ];
        Ok((headers, image.into_body()).into_response())
    }
}

/// Upstream response that passed the relay's checks.
#[derive(Debug)]
pub struct RelayedImage {
    content_type: String,
    content_length: Option<u64>,
    max_bytes: u64,
    response: reqwest::Response,
}

impl RelayedImage {
    /// Upstream MIME type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Declared length, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Streams the body, aborting once it passes the size cap.
    pub fn into_body(self) -> Body {
        let max_bytes = self.max_bytes;
        let chunks = stream::try_unfold(
            (self.response, 0u64),
            move |(mut response, sent)| async move {
                let Some(chunk) = response.chunk().await.map_err(std::io::Error::other)? else {
                    return Ok(None);
                };
                let sent = sent + chunk.len() as u64;
                if sent > max_bytes {
                    warn!(sent, max_bytes, "Aborting relay past size cap");
                    return Err(std::io::Error::other(RelayError::TooLarge(max_bytes)));
                }
                Ok::<_, std::io::Error>(Some((chunk, (response, sent))))
            },
        );
        Body::from_stream(chunks)
    }

    /// Reads the whole body into memory under the size cap.
    #[instrument(skip(self), fields(content_type = %self.content_type))]
    pub async fn collect(mut self) -> Result<Vec<u8>, RelayError> {
        let mut bytes = Vec::new();
        while let Some(chunk) = self
            .response
            .chunk()
            .await
            .map_err(|e| RelayError::from_reqwest(&e))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(RelayError::TooLarge(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!(bytes = bytes.len(), "Collected image body");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url(None), Err(RelayError::MissingUrl));
        assert_eq!(validate_url(Some("  ")), Err(RelayError::MissingUrl));
        assert_eq!(validate_url(Some("/assets/a.jpg")), Err(RelayError::InvalidUrl));
        assert_eq!(validate_url(Some("ftp://example.com/a.jpg")), Err(RelayError::InvalidUrl));
        assert_eq!(validate_url(Some("javascript:alert(1)")), Err(RelayError::InvalidUrl));

        let url = validate_url(Some("https://example.com/a.jpg?w=600")).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(RelayError::NotAnImage.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(RelayError::UpstreamStatus(404).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(RelayError::TooLarge(1).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RelayError::UpstreamStatus(503).to_string(),
            "Upstream returned status 503"
        );
        assert_eq!(
            RelayError::InvalidUrl.to_string(),
            "Invalid url (must be absolute http(s) URL)"
        );
    }
}
