//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides the configured bind address)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Init-db command arguments.
#[derive(Debug, Args)]
pub struct InitDbCommand {
    /// Drop existing tables and recreate the schema, destroying all entries
    #[arg(long)]
    pub force: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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

    /// Print the configuration file path
    Path,

    /// Validate a configuration file
    Validate {
        /// Path to the file to validate (defaults to the standard location)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_command_default_bind() {
        let cmd = ServeCommand { bind: None };
        assert!(cmd.bind.is_none());
    }

    #[test]
    fn test_init_db_command_force_flag() {
        let cmd = InitDbCommand { force: true };
        assert!(cmd.force);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Path;
        assert_eq!(format!("{cmd:?}"), "Path");
    }
}
