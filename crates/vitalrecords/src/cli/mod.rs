//! Command-line interface for vitalrecords.
//!
//! This module provides the CLI structure and output rendering for the
//! `vitrec` binary.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, EditCommand, ImportCommand, ListArgs, OriginArg, OutputFormat,
    RegisterCommand, SearchCommand, SettingArg, SettingCommand, ShowCommand, StatsCommand,
};

/// vitrec - Hospital birth and death registration records
///
/// Shows dashboard statistics, recent registrations and notifications,
/// searches profiles, and edits or discharges individual records.
#[derive(Debug, Parser)]
#[command(name = "vitrec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
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
    /// Show dashboard statistics
    Stats(StatsCommand),

    /// List the most recent registrations
    Activity(ListArgs),

    /// List registration notifications
    Notifications(ListArgs),

    /// List profiles for the profile selector, births first
    Profiles(ListArgs),

    /// Search profiles by name or ID
    Search(SearchCommand),

    /// Show one record
    Show(ShowCommand),

    /// Edit a record in place
    Edit(EditCommand),

    /// Discharge (delete) a birth record
    Discharge {
        /// Record ID
        id: String,
    },

    /// Remove (delete) a death record
    Remove {
        /// Record ID
        id: String,
    },

    /// Append a record to a collection
    Register(RegisterCommand),

    /// Load records from a JSON file
    Import(ImportCommand),

    /// Show or select the active settings page
    Setting(SettingCommand),

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
