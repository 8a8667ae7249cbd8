//! The `schoolhub prefs` command and the preference file it manages.
//!
//! Preferences live in `~/.config/schoolhub/prefs.toml`, or wherever
//! `SCHOOLHUB_PREFS` points.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print the current preferences
    Show,

    /// Change one preference
    Set {
        /// sidebar_collapsed or compact_tables
        key: String,

        /// true/false (also on/off, yes/no)
        value: String,
    },
}

/// Display flags remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub compact_tables: bool,
}

impl Prefs {
    fn set(&mut self, key: &str, value: bool) -> Result<()> {
        match key {
            "sidebar_collapsed" => self.sidebar_collapsed = value,
            "compact_tables" => self.compact_tables = value,
            other => bail!("unknown preference: {other} (expected sidebar_collapsed or compact_tables)"),
        }
        Ok(())
    }
}

fn prefs_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SCHOOLHUB_PREFS") {
        return Some(PathBuf::from(path));
    }
    schoolhub_client::config::dirs_path().map(|dir| dir.join("prefs.toml"))
}

/// Current preferences. Missing or unreadable files yield the defaults.
pub fn load() -> Prefs {
    let Some(path) = prefs_path() else {
        return Prefs::default();
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Prefs::default();
    };
    toml::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
        Prefs::default()
    })
}

fn save(prefs: &Prefs) -> Result<PathBuf> {
    let path = prefs_path().context("cannot locate a preferences file: HOME is not set")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let content = toml::to_string(prefs)?;
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => bail!("expected true or false, got '{other}'"),
    }
}

pub fn execute(action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Show => {
            let prefs = load();
            println!("sidebar_collapsed = {}", prefs.sidebar_collapsed);
            println!("compact_tables = {}", prefs.compact_tables);
        }
        PrefsAction::Set { key, value } => {
            let mut prefs = load();
            prefs.set(&key, parse_flag(&value)?)?;
            let path = save(&prefs)?;
            println!("Saved {key} = {value} to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("ON").unwrap());
        assert!(!parse_flag("no").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut prefs = Prefs::default();
        assert!(prefs.set("theme", true).is_err());
        prefs.set("compact_tables", true).unwrap();
        assert!(prefs.compact_tables);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let prefs: Prefs = toml::from_str("sidebar_collapsed = true\n").unwrap();
        assert!(prefs.sidebar_collapsed);
        assert!(!prefs.compact_tables);
    }
}
