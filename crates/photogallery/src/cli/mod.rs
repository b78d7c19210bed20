//! Command-line interface for photogallery.
//!
//! This module provides the CLI structure for the `photogal` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CaptureCommand, ConfigCommand, DeleteCommand, ListCommand, SearchCommand, ShowCommand,
};

/// photogal - Capture, geotag and browse photos
///
/// Keeps a list of captured photos with the time and place they were taken.
#[derive(Debug, Parser)]
#[command(name = "photogal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all photos, most recent first
    List(ListCommand),

    /// List photos whose date contains the given text
    Search(SearchCommand),

    /// Show the details of one photo
    Show(ShowCommand),

    /// Delete a photo
    Delete(DeleteCommand),

    /// Take a photo
    Capture(CaptureCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
