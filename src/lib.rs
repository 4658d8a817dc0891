//! cbm: a column bookmark manager
//!
//! Keeps a hierarchical bookmark tree with stable node ids, safe moves,
//! fuzzy search, and duplicate detection by normalized URL.
//!
//! Layers, innermost first:
//! - [`domain`]: the tree model and its algorithms, no I/O
//! - [`application`]: workspace and bookmark-store services
//! - [`infrastructure`]: file-backed stores, prompts, the fuzzy picker
//! - [`cli`]: clap commands and the terminal board

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
