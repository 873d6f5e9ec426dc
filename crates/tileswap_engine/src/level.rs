//! Level descriptors and the level catalog.

use crate::error::CatalogError;
use crate::geometry::GridShape;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Grid dimension used when a descriptor omits one (or gives zero).
pub const DEFAULT_GRID_DIMENSION: u32 = 3;

/// Path of the relay endpoint that proxies remote images.
pub const IMAGE_PROXY_PATH: &str = "/api/image-proxy";

/// Image shown by the built-in fallback level.
pub const FALLBACK_IMAGE: &str = "/assets/fallback.jpg";

/// One level of the catalog, as stored in the levels file.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Human-facing level number.
    #[serde(rename = "level", default)]
    level_number: u32,

    /// Grid columns.
    #[serde(rename = "cols", default)]
    columns: u32,

    /// Grid rows.
    #[serde(default)]
    rows: u32,

    /// Difficulty label.
    #[serde(rename = "diff", default)]
    difficulty: String,

    /// Puzzle name.
    #[serde(default)]
    name: String,

    /// Puzzle description.
    #[serde(rename = "desc", default)]
    description: String,

    /// Local asset path or remote URL of the source image.
    #[serde(rename = "imageUrl", default)]
    image_url: String,
}

impl LevelDescriptor {
    /// Creates a descriptor.
    pub fn new(
        level_number: u32,
        columns: u32,
        rows: u32,
        difficulty: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            level_number,
            columns,
            rows,
            difficulty: difficulty.into(),
            name: name.into(),
            description: description.into(),
            image_url: image_url.into(),
        }
    }

    /// The built-in level used when no catalog is available.
    pub fn fallback() -> Self {
        Self::new(
            1,
            DEFAULT_GRID_DIMENSION,
            DEFAULT_GRID_DIMENSION,
            "Easy",
            "Fallback",
            "",
            FALLBACK_IMAGE,
        )
    }

    /// Grid shape, with missing dimensions replaced by the default.
    pub fn grid_shape(&self) -> GridShape {
        let or_default = |value: u32| if value == 0 { DEFAULT_GRID_DIMENSION } else { value };
        GridShape::new(or_default(self.columns), or_default(self.rows))
    }

    /// Parsed image reference.
    pub fn image_reference(&self) -> ImageReference {
        ImageReference::parse(&self.image_url)
    }
}

/// Where a level's image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageReference {
    /// Absolute http(s) URL, fetched through the relay.
    Remote(String),
    /// Path on the asset server, always starting with `/`.
    Local(String),
}

impl ImageReference {
    /// Classifies a raw reference.
    ///
    /// Anything starting with `http://` or `https://` (any case) is remote;
    /// everything else is a local path and gains a leading `/` if missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageReference::Remote(trimmed.to_string())
        } else if trimmed.starts_with('/') {
            ImageReference::Local(trimmed.to_string())
        } else {
            ImageReference::Local(format!("/{}", trimmed))
        }
    }

    /// Server-relative path the canvas loads the image from.
    pub fn fetch_path(&self) -> String {
        match self {
            ImageReference::Remote(url) => {
                let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
                format!("{}?url={}", IMAGE_PROXY_PATH, encoded)
            }
            ImageReference::Local(path) => path.clone(),
        }
    }

    /// Whether the image lives on another host.
    pub fn is_remote(&self) -> bool {
        matches!(self, ImageReference::Remote(_))
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageReference::Remote(url) => write!(f, "{}", url),
            ImageReference::Local(path) => write!(f, "{}", path),
        }
    }
}

/// Ordered, never-empty list of levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelDescriptor>,
}

impl LevelCatalog {
    /// Wraps a list of levels, substituting the fallback level if empty.
    #[instrument(skip_all, fields(count = levels.len()))]
    pub fn new(levels: Vec<LevelDescriptor>) -> Self {
        if levels.is_empty() {
            warn!(error = %CatalogError::Empty, "Using fallback level");
            return Self::fallback();
        }
        info!("Level catalog loaded");
        Self { levels }
    }

    /// Catalog holding only the built-in level.
    pub fn fallback() -> Self {
        Self {
            levels: vec![LevelDescriptor::fallback()],
        }
    }

    /// Parses the JSON levels file format.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let levels: Vec<LevelDescriptor> = serde_json::from_str(json)?;
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { levels })
    }

    /// Parses the JSON levels file, falling back to the built-in level on
    /// any error.
    #[instrument(skip(json))]
    pub fn from_json_or_fallback(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(catalog) => {
                info!(count = catalog.len(), "Level catalog parsed");
                catalog
            }
            Err(e) => {
                warn!(error = %e, "Using fallback level");
                Self::fallback()
            }
        }
    }

    /// Number of levels (at least one).
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at a catalog index.
    pub fn get(&self, index: usize) -> Option<&LevelDescriptor> {
        self.levels.get(index)
    }

    /// Catalog index of the level carrying `level_number`.
    pub fn index_of_number(&self, level_number: u32) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.level_number == level_number)
    }

    /// All levels in order.
    pub fn levels(&self) -> &[LevelDescriptor] {
        &self.levels
    }
}
