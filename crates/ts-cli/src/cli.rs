//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::log::LogArgs;
use crate::commands::suggest::SuggestArgs;

/// TrackStar time tracker.
///
/// Run a stopwatch, log intervals under your own categories and ask Claude
/// which category an interval belongs to.
#[derive(Debug, Parser)]
#[command(name = "trackstar", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run an interactive stopwatch session.
    Track,

    /// Manage categories.
    #[command(subcommand)]
    Categories(CategoriesAction),

    /// Show the time log, newest first.
    Log(LogArgs),

    /// Show logged time per category.
    Summary {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask for a category suggestion for a duration.
    Suggest(SuggestArgs),
}

/// Category management actions.
#[derive(Debug, Subcommand)]
pub enum CategoriesAction {
    /// List categories.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add a category.
    Add {
        /// Display name.
        name: String,
    },
    /// Delete a category. Logged entries keep their category name.
    Delete {
        /// Category ID or name.
        category: String,
    },
    /// Rename a category. Logged entries keep the old name.
    Rename {
        /// Category ID or current name.
        category: String,
        /// New display name.
        name: String,
    },
}
