pub mod check;
pub mod init;
pub mod migrate;
pub mod serve;
pub mod slug;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eventdeck")]
#[command(version)]
#[command(about = "Event gallery front end", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "eventdeck.toml", env = "EVENTDECK_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter configuration and data directory
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Run the web server
    Serve {
        /// Overrides `server.host`
        #[arg(short = 'H', long)]
        host: Option<String>,
        /// Overrides `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply session store migrations
    Migrate,
    /// Validate the configuration and ping the backend
    Check,
    /// Encode or decode secret gallery slugs
    Slug {
        #[command(subcommand)]
        command: SlugCommand,
    },
}

#[derive(Subcommand)]
pub enum SlugCommand {
    Encode { id: u64 },
    Decode { slug: String },
}
