//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default canvas edge in pixels.
pub const DEFAULT_CANVAS_SIZE: u32 = 600;

/// Settings that shape every level the engine builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Canvas width; images are scaled to it and placeholders use it.
    #[serde(default = "default_canvas_size")]
    pub canvas_width: u32,

    /// Canvas height.
    #[serde(default = "default_canvas_size")]
    pub canvas_height: u32,
}

fn default_canvas_size() -> u32 {
    DEFAULT_CANVAS_SIZE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
        }
    }
}

impl EngineConfig {
    /// Square canvas of the given edge.
    pub fn square(size: u32) -> Self {
        Self {
            canvas_width: size,
            canvas_height: size,
        }
    }
}
