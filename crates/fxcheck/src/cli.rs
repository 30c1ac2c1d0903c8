use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::paths::ENV_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "fxcheck",
    author,
    version,
    about = "Inspect and validate GLSL post-processing shader packs"
)]
pub struct Cli {
    /// Shader search root; repeat to search several, earlier roots win.
    #[arg(long = "root", value_name = "DIR", global = true)]
    pub roots: Vec<PathBuf>,

    /// TOML config with `roots = [...]` and a `[pipeline]` table.
    #[arg(long, value_name = "FILE", env = ENV_CONFIG_FILE, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print every shader pack id with its display name.
    List,
    /// Print a pack's manifest, stage paths and uniform defaults.
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Load packs and report problems; exits non-zero if any are found.
    Check {
        /// Pack ids to check; all reachable packs when omitted.
        #[arg(value_name = "ID")]
        ids: Vec<String>,
    },
    /// Print the effective search roots and pipeline settings.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}
