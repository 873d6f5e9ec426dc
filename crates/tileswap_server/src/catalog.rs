//! Loading the level catalog from a file or a running server.

use std::path::{Path, PathBuf};
use tileswap_engine::LevelCatalog;
use tracing::{info, instrument, warn};
use url::Url;

/// Where the console front end reads its levels from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A local levels file.
    File(PathBuf),
    /// `GET /api/levels` on a running server.
    Server(Url),
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Server(url) => write!(f, "{}", url),
        }
    }
}

impl CatalogSource {
    /// Loads the catalog. Never fails: any error yields the fallback level.
    #[instrument(skip(client), fields(source = %self))]
    pub async fn load(&self, client: &reqwest::Client) -> LevelCatalog {
        let text = match self {
            CatalogSource::File(path) => read_file(path).await,
            CatalogSource::Server(base) => fetch_levels(client, base).await,
        };
        match text {
            Some(json) => LevelCatalog::from_json_or_fallback(&json),
            None => LevelCatalog::fallback(),
        }
    }
}

async fn read_file(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            info!(bytes = json.len(), "Read levels file");
            Some(json)
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to read levels file");
            None
        }
    }
}

async fn fetch_levels(client: &reqwest::Client, base: &Url) -> Option<String> {
    let url = match base.join("/api/levels") {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "Failed to build levels URL");
            return None;
        }
    };
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, url = %url, "Failed to fetch levels");
            return None;
        }
    };
    if !response.status().is_success() {
        warn!(status = %response.status(), url = %url, "Levels endpoint returned error");
        return None;
    }
    match response.text().await {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to read levels response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileswap_engine::LevelDescriptor;

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.json");
        std::fs::write(
            &path,
            r#"[{"level": 1, "cols": 2, "rows": 2, "name": "Pier", "imageUrl": "/assets/pier.jpg"}]"#,
        )
        .unwrap();

        let catalog = CatalogSource::File(path).load(&reqwest::Client::new()).await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).map(|l| l.name().as_str()), Some("Pier"));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = CatalogSource::File(dir.path().join("absent.json"));
        let catalog = source.load(&reqwest::Client::new()).await;
        assert_eq!(catalog.levels(), &[LevelDescriptor::fallback()]);
    }
}
