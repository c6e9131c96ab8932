// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imagedash")]
#[command(about = "Container image dashboard backend for docker, nerdctl and crictl")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print essential results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the configuration file (default: discover imagedash.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an imagedash.yml configuration template
    Init {
        /// Pin a runtime instead of probing (docker, nerdctl, crictl)
        #[arg(long)]
        runtime: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Listen address (overrides config and IMAGEDASH_BIND)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Show which container runtime commands are dispatched to
    Runtime,

    /// List tagged images
    Images,

    /// Remove images
    Rmi {
        #[arg(required = true)]
        images: Vec<String>,
    },

    /// Save images to a tar archive
    Save {
        /// Archive to write
        #[arg(short, long)]
        output: PathBuf,

        #[arg(required = true)]
        images: Vec<String>,
    },

    /// Load images from a tar archive
    Load {
        /// Archive to read
        #[arg(short, long)]
        input: PathBuf,
    },
}
