//! # Commands
//!
//! One module per command group. Each command takes the [`AppContext`],
//! does its work through the library crates, and prints through
//! [`Output`].
//!
//! ```text
//! commands/
//! ├── location.rs  ◄─── location add|list|remove|show
//! ├── item.rs      ◄─── mint, assign, show, search, counts
//! ├── sheet.rs     ◄─── sheet
//! └── config.rs    ◄─── config show|init (no database)
//! ```

pub mod config;
pub mod item;
pub mod location;
pub mod sheet;

use serde::Serialize;

use crate::error::CliResult;

/// Prints either human-readable lines or one JSON document.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Prints `value` as JSON, or runs `human` to print it as text.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}
