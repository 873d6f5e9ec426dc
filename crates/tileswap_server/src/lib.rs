//! Tileswap server - assets, image relay and console play
//!
//! Companion crate to `tileswap_engine`. It serves what a browser front end
//! needs (level catalog, static files and a relay for cross-origin images)
//! and ships a terminal front end that plays the engine directly.
//!
//! # Architecture
//!
//! - **Config**: `tileswap.toml` with defaults and a `PORT` override
//! - **Routes**: `/api/levels`, `/api/image-proxy` and static mounts
//! - **Relay**: validated, size- and time-limited image streaming
//! - **Play**: stdin commands, text rendering, background image loads

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod acquire;
pub mod assets;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod play;
pub mod relay;
pub mod render;
pub mod routes;

// Crate-level exports - Configuration
pub use config::{ConfigError, RelayConfig, ServerConfig};

// Crate-level exports - HTTP
pub use relay::{ImageRelay, RelayError};
pub use routes::{router, serve, AppState};

// Crate-level exports - Console
pub use acquire::{AssetAcquirer, ImageAcquirer};
pub use catalog::CatalogSource;
pub use play::{play, Console, ConsoleCommand};
