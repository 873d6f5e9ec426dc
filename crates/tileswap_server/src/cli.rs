//! Command-line interface for tileswap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tileswap - tile-swap image puzzles
#[derive(Parser, Debug)]
#[command(name = "tileswap")]
#[command(about = "Tile-swap image puzzle server and console player", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "tileswap.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the level catalog, static assets and the image relay over HTTP
    Serve {
        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Play the puzzle in the terminal
    Play {
        /// Levels file (defaults to the configured levels path)
        #[arg(long, conflicts_with = "server_url")]
        levels: Option<PathBuf>,

        /// Load levels and images from a running tileswap server
        #[arg(long)]
        server_url: Option<String>,

        /// Seed for reproducible shuffles
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["tileswap", "serve", "--port", "8080"]);
        assert_eq!(cli.config, PathBuf::from("tileswap.toml"));
        assert!(matches!(cli.command, Command::Serve { port: Some(8080), host: None }));
    }

    #[test]
    fn test_parse_play() {
        let cli = Cli::parse_from(["tileswap", "play", "--seed", "7", "-c", "alt.toml"]);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        match cli.command {
            Command::Play { levels, server_url, seed } => {
                assert_eq!(levels, None);
                assert_eq!(server_url, None);
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_levels_conflicts_with_server() {
        let result = Cli::try_parse_from([
            "tileswap",
            "play",
            "--levels",
            "a.json",
            "--server-url",
            "http://localhost:3000",
        ]);
        assert!(result.is_err());
    }
}
