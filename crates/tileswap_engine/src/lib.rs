//! Tileswap engine - tile-grid swap puzzles
//!
//! An image is cut into a grid of tiles, the tiles are shuffled into a
//! non-solved arrangement, and the player swaps pairs until every tile is
//! back home. The engine owns the puzzle state; fetching images and drawing
//! pixels are left to the caller.
//!
//! # Architecture
//!
//! - **Geometry**: source-image partitioning and display-grid hit testing
//! - **Registry**: tiles plus an O(1) slot index, mutated only by swaps
//! - **Invariants / Contracts**: permutation checks around every swap
//! - **Shuffle**: uniform permutations that never leave the level solved
//! - **Selection**: the two-tap select/swap state machine
//! - **Session**: level lifecycle with stale-load protection
//!
//! # Example
//!
//! ```
//! use tileswap_engine::{EngineConfig, FisherYates, LevelCatalog, PuzzleSession, Raster};
//!
//! let catalog = LevelCatalog::fallback();
//! let mut session = PuzzleSession::new(EngineConfig::default(), catalog, FisherYates::from_seed(7));
//!
//! let request = session.start().unwrap().unwrap();
//! let raster = Raster::acquired(600, 600, "image/jpeg", 4096);
//! session.complete_load(request.ticket, Ok(raster));
//!
//! assert!(!session.is_solved());
//! assert_eq!(session.cells().len(), 9);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod acquisition;
mod config;
mod error;
mod geometry;
mod level;
mod phases;
mod registry;
mod selection;
mod session;
mod shuffle;
mod solved;

pub mod contracts;
pub mod invariants;

// Crate-level exports - Geometry
pub use geometry::{partition, DisplayGrid, GridShape, SourceRect, MAX_GRID_DIMENSION};

// Crate-level exports - Registry
pub use registry::{Tile, TileRegistry};

// Crate-level exports - Permutation and solved detection
pub use shuffle::{shuffle, FisherYates, Shuffler};
pub use solved::{is_solved, tiles_home, SolvedCache};

// Crate-level exports - Interaction
pub use selection::{Selection, SelectionMachine, Transition};

// Crate-level exports - Levels and acquisition
pub use acquisition::{
    AcquisitionError, LoadOutcome, LoadRequest, LoadTicket, Raster, RasterOrigin,
    PLACEHOLDER_MESSAGE,
};
pub use level::{
    ImageReference, LevelCatalog, LevelDescriptor, DEFAULT_GRID_DIMENSION, FALLBACK_IMAGE,
    IMAGE_PROXY_PATH,
};

// Crate-level exports - Lifecycle
pub use config::{EngineConfig, DEFAULT_CANVAS_SIZE};
pub use phases::{CellView, Phase, SessionEvent, TapOutcome};
pub use session::PuzzleSession;

// Crate-level exports - Errors
pub use error::{CatalogError, LifecycleError, RegistryError};
