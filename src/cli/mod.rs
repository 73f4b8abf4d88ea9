//! CLI module - Command-line interface for Warbler
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Warbler - a small Twitter-style message board
#[derive(Parser)]
#[command(name = "warbler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    #[command(alias = "s")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Apply pending database migrations and exit
    Migrate,

    /// List users with their message and follower counts
    #[command(alias = "ls")]
    Users {
        /// Only show usernames containing this text
        query: Option<String>,
    },
}

pub use commands::*;
