//! Config commands. These never touch the database.

use std::path::PathBuf;

use tally_live::{LiveError, TallyConfig};

use crate::cli::ConfigAction;
use crate::commands::Output;
use crate::error::{CliError, CliResult};

pub fn run(
    config: &TallyConfig,
    path: Option<PathBuf>,
    action: ConfigAction,
    out: Output,
) -> CliResult<()> {
    match action {
        ConfigAction::Show => show(config, out),
        ConfigAction::Init { force } => init(path, force, out),
    }
}

pub fn show(config: &TallyConfig, out: Output) -> CliResult<()> {
    if out.json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        let text = toml::to_string_pretty(config).map_err(LiveError::from)?;
        print!("{text}");
    }
    Ok(())
}

/// Writes the default config. Refuses to overwrite unless `force`.
pub fn init(path: Option<PathBuf>, force: bool, out: Output) -> CliResult<()> {
    let target = path
        .or_else(TallyConfig::default_config_path)
        .ok_or_else(|| CliError::Invalid("no config path available, pass --config".into()))?;

    if target.exists() && !force {
        return Err(CliError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        )));
    }

    let written = TallyConfig::default().save(Some(target))?;
    out.emit(&written, |path| println!("✓ Config written to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        let out = Output { json: true };

        init(Some(path.clone()), false, out).unwrap();
        assert!(path.exists());

        let err = init(Some(path.clone()), false, out).unwrap_err();
        assert!(matches!(err, CliError::Invalid(_)));

        init(Some(path.clone()), true, out).unwrap();
        let loaded = TallyConfig::load(Some(path)).unwrap();
        assert!(loaded.cache.enabled);
    }
}
