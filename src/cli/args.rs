//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Build a collapsible category tree from flat CSV rows: JSON, interactive HTML, terminal outline
#[derive(Parser, Debug)]
#[command(name = "csvtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file layered over the global config (default: ./.csvtree.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the tree and write JSON and HTML artifacts
    Build {
        /// Input CSV
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// JSON output (default: <stem>_tree.json)
        #[arg(long, conflicts_with = "no_json")]
        json: Option<PathBuf>,
        /// HTML output (default: <stem>_tree.html)
        #[arg(long, conflicts_with = "no_html")]
        html: Option<PathBuf>,
        /// Do not write JSON
        #[arg(long)]
        no_json: bool,
        /// Do not write HTML
        #[arg(long)]
        no_html: bool,
    },

    /// Report diagnostics and level counts without writing anything
    Check {
        /// Input CSV
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Print the built tree
    Tree {
        /// Input CSV
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Show what the interactive view displays after a sequence of clicks
    Outline {
        /// Input CSV
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Click the node at this '/'-separated name path; '\/' is a literal slash (repeatable, applied in order)
        #[arg(short, long = "toggle", value_name = "PATH")]
        toggles: Vec<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
