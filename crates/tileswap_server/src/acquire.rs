//! Image acquisition for the console front end.

use crate::assets::{self, is_image};
use crate::relay::{validate_url, ImageRelay};
use std::path::PathBuf;
use tileswap_engine::{AcquisitionError, ImageReference, LoadRequest, Raster};
use tracing::{debug, info, instrument};
use url::Url;

/// Fetches the image for a level load.
#[async_trait::async_trait]
pub trait ImageAcquirer: Send + Sync {
    /// Acquires the image named by `request`.
    ///
    /// Acquired images are treated as scaled to the request's canvas, so the
    /// returned raster has canvas dimensions.
    async fn acquire(&self, request: &LoadRequest) -> Result<Raster, AcquisitionError>;
}

/// Acquirer reading local assets from disk and remote images through the
/// relay, or everything from a running server when one is configured.
#[derive(Debug, Clone)]
pub struct AssetAcquirer {
    static_root: PathBuf,
    server: Option<Url>,
    client: reqwest::Client,
    relay: ImageRelay,
}

/// Bytes of an acquired image and their type.
struct Fetched {
    content_type: String,
    byte_len: usize,
}

impl AssetAcquirer {
    /// Acquirer reading from `static_root`, relaying remote images itself.
    pub fn local(static_root: impl Into<PathBuf>, relay: ImageRelay) -> Self {
        Self {
            static_root: static_root.into(),
            server: None,
            client: reqwest::Client::new(),
            relay,
        }
    }

    /// Acquirer loading every image from a running server.
    pub fn from_server(server: Url, relay: ImageRelay) -> Self {
        Self {
            static_root: PathBuf::new(),
            server: Some(server),
            client: reqwest::Client::new(),
            relay,
        }
    }

    async fn read_local(&self, path: &str) -> Result<Fetched, String> {
        let file = assets::resolve(&self.static_root, path)
            .ok_or_else(|| "path escapes the static root".to_string())?;
        let bytes = tokio::fs::read(&file)
            .await
            .map_err(|e| format!("{}: {}", file.display(), e))?;
        Ok(Fetched {
            content_type: assets::content_type_for(&file).to_string(),
            byte_len: bytes.len(),
        })
    }

    async fn relay_direct(&self, raw: &str) -> Result<Fetched, String> {
        let url = validate_url(Some(raw)).map_err(|e| e.to_string())?;
        let image = self.relay.fetch(&url).await.map_err(|e| e.to_string())?;
        let content_type = image.content_type().to_string();
        let bytes = image.collect().await.map_err(|e| e.to_string())?;
        Ok(Fetched {
            content_type,
            byte_len: bytes.len(),
        })
    }

    async fn fetch_from_server(&self, server: &Url, fetch_path: &str) -> Result<Fetched, String> {
        let url = server.join(fetch_path).map_err(|e| e.to_string())?;
        debug!(url = %url, "Fetching image from server");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body.trim()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(Fetched {
            content_type,
            byte_len: bytes.len(),
        })
    }
}

#[async_trait::async_trait]
impl ImageAcquirer for AssetAcquirer {
    #[instrument(skip(self, request), fields(image = %request.image, ticket = ?request.ticket))]
    async fn acquire(&self, request: &LoadRequest) -> Result<Raster, AcquisitionError> {
        let fetched = match (&self.server, &request.image) {
            (Some(server), image) => self.fetch_from_server(server, &image.fetch_path()).await,
            (None, ImageReference::Local(path)) => self.read_local(path).await,
            (None, ImageReference::Remote(url)) => self.relay_direct(url).await,
        }
        .map_err(|message| AcquisitionError::new(request.image.to_string(), message))?;

        if fetched.byte_len == 0 {
            return Err(AcquisitionError::new(request.image.to_string(), "empty image"));
        }
        if !is_image(&fetched.content_type) {
            return Err(AcquisitionError::new(
                request.image.to_string(),
                format!("not an image ({})", fetched.content_type),
            ));
        }

        let (width, height) = request.canvas;
        info!(
            content_type = %fetched.content_type,
            bytes = fetched.byte_len,
            "Image acquired"
        );
        Ok(Raster::acquired(
            width,
            height,
            fetched.content_type,
            fetched.byte_len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use tileswap_engine::{LevelDescriptor, LoadTicket};

    fn request(image_url: &str) -> LoadRequest {
        let descriptor = LevelDescriptor::new(1, 3, 3, "Easy", "Test", "", image_url);
        LoadRequest {
            ticket: LoadTicket::new(1, 0),
            image: descriptor.image_reference(),
            descriptor,
            canvas: (600, 600),
        }
    }

    fn acquirer(root: &std::path::Path) -> AssetAcquirer {
        AssetAcquirer::local(root, ImageRelay::new(RelayConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_local_image_reports_canvas_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/harbor.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let raster = acquirer(dir.path())
            .acquire(&request("/assets/harbor.png"))
            .await
            .unwrap();
        assert_eq!((raster.width(), raster.height()), (600, 600));
        assert!(!raster.is_placeholder());
    }

    #[tokio::test]
    async fn test_missing_local_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = acquirer(dir.path())
            .acquire(&request("/assets/absent.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err.reference, "/assets/absent.jpg");
    }

    #[tokio::test]
    async fn test_non_image_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let err = acquirer(dir.path())
            .acquire(&request("notes.txt"))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("not an image"));
    }
}
