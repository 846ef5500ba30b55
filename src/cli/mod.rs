//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Health data export, import and merge engine
#[derive(Parser, Debug)]
#[command(name = "htx", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data root (default: ~/.healthtransfer)
    #[arg(long, global = true, env = "HTX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Primary database path (default: <data-dir>/data/healthconnect.db)
    #[arg(long, global = true, env = "HTX_DB")]
    pub db: Option<PathBuf>,

    /// Device user whose settings and jobs to use
    #[arg(long, global = true, env = "HTX_USER", default_value_t = 0)]
    pub user: u32,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the primary health database
    Init,

    /// Print version information
    Version,

    /// Export the database to the configured destination now
    Export,

    /// Import an export archive and merge it into the database
    Import {
        /// Archive location (file:// URI or path)
        uri: String,
    },

    /// Update export settings and reschedule the periodic export
    Configure {
        /// Days between scheduled exports (0 disables them)
        #[arg(long)]
        period: Option<i32>,

        /// Where export archives are written (file:// URI or path)
        #[arg(long)]
        destination: Option<String>,
    },

    /// Show export settings and the last export and import outcome
    Status,

    /// List document providers that can receive an export
    Providers,

    /// Periodic job management
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommands {
    /// Run registered jobs whose window has opened
    Run {
        /// Run every registered job regardless of its window
        #[arg(long)]
        force: bool,
    },

    /// Show registered jobs
    List,
}
