//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Column bookmark manager: import, edit, search and de-duplicate a bookmark tree
#[derive(Parser, Debug)]
#[command(name = "cbm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Extra config file, applied after the global one
    #[arg(long, global = true, env = "CBM_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace the workspace with a bookmarks JSON file
    Import {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Write the workspace as portable JSON (bookmarks-YYYY-MM-DD.json)
    Export {
        /// Output file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Forget the local workspace
    Clear,

    /// Render the bookmark board
    Show {
        /// Search query; a leading ' matches literally
        query: Option<String>,
        /// Only bookmarks whose URL occurs more than once
        #[arg(short, long)]
        duplicates: bool,
        /// Print node ids
        #[arg(long)]
        ids: bool,
        /// Ignore collapsed flags
        #[arg(short, long)]
        all: bool,
    },

    /// List duplicate URLs with their bookmarks
    Duplicates,

    /// Rename a bookmark or folder
    Rename { id: String, title: String },

    /// Delete a bookmark or folder
    Delete { id: String },

    /// Append an empty folder to PARENT
    AddFolder { parent: String, name: String },

    /// Move a node under PARENT at INDEX (default: last)
    Move {
        id: String,
        parent: String,
        index: Option<usize>,
    },

    /// Collapse a folder
    Collapse { id: String },

    /// Expand a folder
    Expand { id: String },

    /// Toggle a folder
    Toggle { id: String },

    /// Collapse every folder below ID
    CollapseAll { id: String },

    /// Expand every folder below ID
    ExpandAll { id: String },

    /// Print the folder path of a node
    Breadcrumb { id: String },

    /// Pick a bookmark interactively and print its URL
    Pick {
        /// Initial filter applied before the picker opens
        query: Option<String>,
    },

    /// Sync with the bookmark store
    Store {
        #[command(subcommand)]
        command: StoreCommands,
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
pub enum StoreCommands {
    /// Replace the store contents with a bookmarks JSON file
    Import {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Write the store tree without ids (chrome-bookmarks-YYYY-MM-DD.json)
    Export {
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Remove everything below the store's top-level roots
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file location
    Path,
    /// Print a config template
    Template,
}
