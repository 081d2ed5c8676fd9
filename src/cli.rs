//! CLI argument parsing using clap v4
//!
//! Every hierarchy command runs as a given person (`--as <id>`), with the
//! same view that person gets in the web application.

use clap::{Parser, Subcommand};

/// URNA - campaign recruitment hierarchy tool
///
/// Answers who-can-see-whom questions, shows direct reports and network
/// metrics, and registers voters against a hierarchy snapshot.
#[derive(Parser, Debug)]
#[command(name = "urna")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "URNA_CONFIG")]
    pub config: Option<String>,

    /// Hierarchy snapshot to use instead of the configured one
    #[arg(long, global = true)]
    pub snapshot: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether one person may see another's profile
    CanView {
        /// Requesting person
        #[arg(long = "as", value_name = "ID")]
        acting: String,

        /// Person whose profile is requested
        target: String,
    },

    /// Show a profile
    Profile {
        #[arg(long = "as", value_name = "ID")]
        acting: String,

        target: String,
    },

    /// Direct reports grouped by rank (defaults to the acting person's own)
    Reports {
        #[arg(long = "as", value_name = "ID")]
        acting: String,

        target: Option<String>,
    },

    /// Subtree size, depth and rank mix
    Metrics {
        #[arg(long = "as", value_name = "ID", required_unless_present = "all")]
        acting: Option<String>,

        target: Option<String>,

        /// Metrics for every top-level person (operator audit)
        #[arg(long, conflicts_with_all = ["acting", "target"])]
        all: bool,
    },

    /// Everyone below the acting person, newest registration first
    Roster {
        #[arg(long = "as", value_name = "ID")]
        acting: String,
    },

    /// Register a voter under the acting person
    Enroll {
        #[arg(long = "as", value_name = "ID")]
        acting: String,

        /// Identification number of the new voter
        #[arg(long)]
        id: String,

        #[arg(long)]
        first_names: String,

        #[arg(long)]
        last_names: String,

        /// Mobile number, 10 digits starting with 3
        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        neighborhood: Option<String>,

        #[arg(long)]
        voting_place: Option<String>,

        /// 0 (doubtful) to 100 (secured)
        #[arg(long)]
        quality_score: Option<u8>,
    },

    /// Move a person under a new supervisor
    Reassign {
        #[arg(long = "as", value_name = "ID")]
        acting: String,

        person: String,

        /// New supervisor
        #[arg(long = "to", value_name = "ID")]
        new_parent: String,
    },

    /// Audit the snapshot for cycles, dangling parents and duplicate ids
    Check,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate,
}
