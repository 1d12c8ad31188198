//! CLI module for Taskgate
//!
//! Command-line parsing for the `taskgate-server` binary. Uses clap for
//! argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taskgate - multi-user task management server
#[derive(Parser, Debug)]
#[command(
    name = "taskgate-server",
    version,
    about = "Taskgate - multi-user task management server",
    long_about = "A REST service for per-user task lists with JWT authentication\n\
                  and an administrator role.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a new deployment.",
    after_help = "EXAMPLES:\n    \
                  taskgate-server init                       # Scaffold taskgate.toml and .env.example\n    \
                  taskgate-server create-admin --username root --password s3cret\n    \
                  taskgate-server                            # Start the server (requires taskgate.toml)\n    \
                  taskgate-server --config prod.toml         # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "taskgate.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default when no subcommand is given)
    Serve,

    /// Initialize a new deployment directory
    ///
    /// Creates taskgate.toml, .env.example, .gitignore and data/.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Also check that referenced environment variables are set
        #[arg(long)]
        validate: bool,
    },

    /// Create an administrator account directly in the store
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long)]
        password: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
