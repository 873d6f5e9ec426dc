//! Boundary types for asynchronous image acquisition.
//!
//! The engine never fetches or decodes images. It hands out a
//! [`LoadRequest`] when a level starts loading and expects the matching
//! [`LoadTicket`] back with the result, whenever the fetch finishes.

use crate::level::{ImageReference, LevelDescriptor};
use serde::{Deserialize, Serialize};

/// Message painted on the placeholder raster.
pub const PLACEHOLDER_MESSAGE: &str = "Image failed to load";

/// Provenance of a raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterOrigin {
    /// Loaded from the level's image.
    Acquired {
        /// MIME type reported by the source.
        content_type: String,
        /// Payload size in bytes.
        byte_len: usize,
    },
    /// Substituted after an acquisition failure.
    Placeholder,
}

/// A ready-to-sample image of known size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raster {
    width: u32,
    height: u32,
    origin: RasterOrigin,
}

impl Raster {
    /// Raster produced by a successful acquisition.
    pub fn acquired(width: u32, height: u32, content_type: impl Into<String>, byte_len: usize) -> Self {
        Self {
            width,
            height,
            origin: RasterOrigin::Acquired {
                content_type: content_type.into(),
                byte_len,
            },
        }
    }

    /// Flat placeholder of the given canvas size.
    ///
    /// Deterministic: the same size always yields the same raster.
    pub fn placeholder(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            origin: RasterOrigin::Placeholder,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Where the raster came from.
    pub fn origin(&self) -> &RasterOrigin {
        &self.origin
    }

    /// Whether this is the failure placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, RasterOrigin::Placeholder)
    }
}

/// Image fetch or decode failure reported by the acquirer.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Failed to acquire {}: {}", reference, message)]
pub struct AcquisitionError {
    /// Reference that failed.
    pub reference: String,
    /// What went wrong.
    pub message: String,
}

impl AcquisitionError {
    /// Creates an acquisition error.
    pub fn new(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Identifies one level load.
///
/// Completions carrying a ticket from an older generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct LoadTicket {
    /// Load generation the request was issued in.
    pub generation: u64,
    /// Catalog index of the level being loaded.
    pub level_index: usize,
}

/// Work order for the image acquirer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Ticket to hand back with the result.
    pub ticket: LoadTicket,
    /// Level being loaded.
    pub descriptor: LevelDescriptor,
    /// Image to fetch.
    pub image: ImageReference,
    /// Canvas size the image is scaled to.
    pub canvas: (u32, u32),
}

/// What `complete_load` did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadOutcome {
    /// Level built from the acquired image.
    Ready,
    /// Acquisition failed; level built from the placeholder.
    ReadyWithPlaceholder,
    /// Completion belonged to a superseded load and was dropped.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_deterministic() {
        assert_eq!(Raster::placeholder(600, 600), Raster::placeholder(600, 600));
        assert!(Raster::placeholder(600, 600).is_placeholder());
        assert!(!Raster::acquired(600, 600, "image/png", 10).is_placeholder());
    }

    #[test]
    fn test_acquisition_error_display() {
        let err = AcquisitionError::new("/assets/a.jpg", "not found");
        assert_eq!(err.to_string(), "Failed to acquire /assets/a.jpg: not found");
    }
}
