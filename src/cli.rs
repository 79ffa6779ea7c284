use crate::presenter::Tab;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cryptoscope",
    about = "CryptoScope - crypto detection dashboard for firmware analysis results",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Prediction API base URL (overrides CRYPTOSCOPE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session name; results cached by `submit` are read back by `show`
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Skip the pipeline animation and assistant typing delay
    #[arg(long, global = true)]
    pub fast: bool,

    /// Enable verbose logging of all operations
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide progress output and use quiet logging
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve the current result and render the dashboard
    Show {
        /// Persisted analysis identifier
        #[arg(long)]
        id: Option<String>,

        /// Result origin; `db` selects the persisted record
        #[arg(long)]
        from: Option<String>,

        /// Raw navigation query such as `?id=42&from=db`
        #[arg(long, conflicts_with_all = ["id", "from"])]
        query: Option<String>,

        /// Also write an HTML report to this path
        #[arg(long)]
        html: Option<PathBuf>,

        /// Tab to open
        #[arg(long, value_enum, default_value = "overview")]
        tab: Tab,

        /// Draw algorithm tables as bars
        #[arg(long)]
        graph: bool,
    },

    /// Upload a binary for analysis, then show the result
    Submit {
        /// Firmware or binary file to analyze
        file: PathBuf,

        /// Also write an HTML report to this path
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Ask the assistant about the cached result
    Ask {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}
