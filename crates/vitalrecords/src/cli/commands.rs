//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::Origin;

/// Dashboard statistics arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Arguments shared by the feed and listing commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Maximum number of entries (defaults to the configured limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Matches first name, last name or record ID
    pub query: String,

    #[command(flatten)]
    pub list: ListArgs,
}

/// Show a single record.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Collection the record belongs to
    #[arg(value_enum)]
    pub origin: OriginArg,

    /// Record ID
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Edit a record in place.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Collection the record belongs to
    #[arg(value_enum)]
    pub origin: OriginArg,

    /// Record ID
    pub id: String,

    /// Field assignment using the stored field name, e.g. `lastName=Lee`
    #[arg(short, long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// JSON object merged over the record
    #[arg(long, value_name = "JSON")]
    pub patch: Option<String>,
}

/// Append a record to a collection.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Collection to append to
    #[arg(value_enum)]
    pub origin: OriginArg,

    /// The record as a JSON object
    #[arg(long, value_name = "JSON")]
    pub json: String,
}

/// Load records from a JSON file.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Collection to import into
    #[arg(value_enum)]
    pub origin: OriginArg,

    /// File holding a JSON array of records
    pub file: PathBuf,

    /// Overwrite the collection instead of appending
    #[arg(long)]
    pub replace: bool,
}

/// Read or change the selected setting.
#[derive(Debug, Args)]
pub struct SettingCommand {
    /// Setting to select; prints the current one when omitted
    #[arg(value_enum)]
    pub name: Option<SettingArg>,

    /// List the menu entries whose title contains this text
    #[arg(long, conflicts_with = "name")]
    pub filter: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Collection argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OriginArg {
    /// Birth records
    Birth,
    /// Death records
    Death,
}

impl From<OriginArg> for Origin {
    fn from(arg: OriginArg) -> Self {
        match arg {
            OriginArg::Birth => Self::Birth,
            OriginArg::Death => Self::Death,
        }
    }
}

/// Entries of the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingArg {
    Dashboard,
    BirthRegistration,
    DeathRegistration,
    Certificates,
    UserManagement,
    System,
}

impl SettingArg {
    /// The value persisted for this entry.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::BirthRegistration => "birth-registration",
            Self::DeathRegistration => "death-registration",
            Self::Certificates => "certificates",
            Self::UserManagement => "user-management",
            Self::System => "system",
        }
    }

    /// The menu title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::BirthRegistration => "Birth Registration",
            Self::DeathRegistration => "Death Registration",
            Self::Certificates => "Certificates",
            Self::UserManagement => "User Management",
            Self::System => "System",
        }
    }

    /// Menu entries whose title contains `query`, ignoring case, in menu
    /// order. An empty query matches every entry.
    #[must_use]
    pub fn matching(query: &str) -> Vec<Self> {
        let query = query.to_lowercase();
        Self::value_variants()
            .iter()
            .copied()
            .filter(|setting| setting.title().to_lowercase().contains(&query))
            .collect()
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

/// Parse a `FIELD=VALUE` pair.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}
