use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "kithound", version, author = "kithound")]
#[command(about = "Discovers, retrieves and statically classifies phishing kits")]
pub struct Cli {
    /// Verbose human output
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Custom config file path
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Refresh the seed URL list from the public phishing feeds
    Update {
        /// Merge into the existing list instead of replacing it
        #[arg(long = "append", action = ArgAction::SetTrue)]
        append: bool,
    },

    /// Probe seed URLs for exposed kit archives and download new ones
    Hunt {
        /// Probe the extended list of ~30 legacy archive extensions
        #[arg(long = "all-extensions", action = ArgAction::SetTrue)]
        all_extensions: bool,
    },

    /// Extract and classify downloaded kits, then print aggregate stats
    Analyze,

    /// Print aggregate stats from the existing ledger only
    Stats,
}
