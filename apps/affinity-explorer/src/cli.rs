//! Command line definition.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "affinity-explorer")]
#[command(about = "Browse affinities and your recently viewed list", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Signed-in user; omit to browse anonymously
    #[arg(short, long, global = true, env = "AFFINITY_USER")]
    pub user: Option<String>,

    /// Log output format
    #[arg(
        long,
        global = true,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        ignore_case = true
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the affinity catalog
    Affinities {
        /// Only show affinities in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one affinity and record it as viewed
    Show {
        /// Affinity id, with or without the `aff` prefix
        id: String,
    },
    /// Print the recently viewed list
    Recent,
    /// Forget the recently viewed list kept on this machine
    ClearRecent,
}
