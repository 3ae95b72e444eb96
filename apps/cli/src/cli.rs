//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Track physical items by printed codes and locations")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage locations
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Mint fresh codes and store them as blank items
    Mint {
        /// How many codes
        #[arg(long, short = 'n', default_value_t = 9)]
        count: usize,
    },
    /// Set an item's location, name, quality and comment
    Assign(AssignArgs),
    /// Show one item by code
    Show {
        code: String,
    },
    /// Search item names and comments
    Search {
        term: String,
    },
    /// Items per location
    Counts,
    /// Compose a printable sheet
    Sheet(SheetArgs),
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum LocationAction {
    /// Create a location
    Add { name: String },
    /// List locations with their item counts
    List,
    /// Delete a location (its items keep pointing at it)
    Remove {
        /// Location id or name
        location: String,
    },
    /// Show a location and its items
    Show {
        /// Location id or name
        location: String,
    },
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Item code
    pub code: String,

    /// Location id or name; "none" clears it
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Item name
    #[arg(long)]
    pub name: Option<String>,

    /// Quality from 1 to 5
    #[arg(long, short = 'q')]
    pub quality: Option<i64>,

    /// Free-form comment
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug)]
pub struct SheetArgs {
    /// Reprint one existing code instead of minting a batch of nine
    #[arg(long)]
    pub reprint: Option<String>,

    /// Output directory (defaults to the configured one)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assign() {
        let cli = Cli::try_parse_from([
            "tally", "assign", "abc", "--location", "Garage", "-q", "3", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Assign(args) => {
                assert_eq!(args.code, "abc");
                assert_eq!(args.location.as_deref(), Some("Garage"));
                assert_eq!(args.quality, Some(3));
                assert!(args.name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_mint_default_count() {
        let cli = Cli::try_parse_from(["tally", "mint"]).unwrap();
        assert!(matches!(cli.command, Command::Mint { count: 9 }));
    }
}
