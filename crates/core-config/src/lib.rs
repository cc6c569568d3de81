//! Configuration loading and parsing.
//!
//! Parses `oxmodal.toml` (or an override path provided by the binary):
//! `[input]` engine settings and `[[map]]` remap entries, adapted onto a
//! [`KeymapsBuilder`]. Unknown fields are ignored (TOML deserialization
//! tolerance) so the file can grow without immediate warnings. A file that
//! fails to parse falls back to defaults; a single bad `[[map]]` entry is
//! logged and skipped.

use anyhow::{Context, Result, anyhow, bail};
use core_keymap::{Expansion, Keymaps, KeymapsBuilder, RemapOptions};
use core_state::ModeSet;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InputConfig {
    /// Recursion bound for remap expansion.
    #[serde(default = "InputConfig::default_max_map_depth")]
    pub max_map_depth: u32,
    /// Printable characters in text-entry modes dispatch `insert`.
    #[serde(default = "InputConfig::default_insert_unmapped")]
    pub insert_unmapped: bool,
    #[serde(default = "InputConfig::default_max_count")]
    pub max_count: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_map_depth: Self::default_max_map_depth(),
            insert_unmapped: Self::default_insert_unmapped(),
            max_count: Self::default_max_count(),
        }
    }
}

impl InputConfig {
    const fn default_max_map_depth() -> u32 {
        1000
    }
    const fn default_insert_unmapped() -> bool {
        true
    }
    const fn default_max_count() -> u32 {
        999_999
    }
}

/// One `[[map]]` entry.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct MapEntry {
    /// Vim map-command prefix (`n`, `x`, `o`, `i`, ...); empty means n+v+o.
    #[serde(default)]
    pub mode: String,
    /// Key-notation left-hand side.
    pub lhs: Option<String>,
    /// Text-command left-hand side.
    pub text: Option<String>,
    pub rhs: Option<String>,
    pub rhs_text: Option<Vec<String>>,
    #[serde(default)]
    pub noremap: bool,
    pub filetype: Option<String>,
}

impl MapEntry {
    fn describe(&self) -> String {
        self.lhs
            .clone()
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "<missing lhs>".to_string())
    }

    /// Add this entry to `builder`.
    pub fn apply(&self, builder: &mut KeymapsBuilder) -> Result<()> {
        let modes = ModeSet::from_map_prefix(&self.mode)
            .ok_or_else(|| anyhow!("unknown map mode '{}'", self.mode))?;
        let rhs = match (&self.rhs, &self.rhs_text) {
            (Some(keys), None) => Expansion::parse_keys(keys)
                .with_context(|| format!("invalid rhs notation '{keys}'"))?,
            (None, Some(names)) => Expansion::text(names.iter().cloned()),
            _ => bail!("exactly one of 'rhs' or 'rhs_text' is required"),
        };
        let mut options = if self.noremap {
            RemapOptions::noremap()
        } else {
            RemapOptions::recursive()
        };
        if let Some(ft) = &self.filetype {
            options = options.file_type(ft.clone());
        }
        match (&self.lhs, &self.text) {
            (Some(lhs), None) => builder.remap(modes, lhs, rhs, options)?,
            (None, Some(name)) => builder.remap_text(modes, name, rhs, options)?,
            _ => bail!("exactly one of 'lhs' or 'text' is required"),
        };
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub map: Vec<MapEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxmodal.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxmodal").join("oxmodal.toml");
    }
    PathBuf::from("oxmodal.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                remaps = file.map.len(),
                "config_loaded"
            );
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn input(&self) -> &InputConfig {
        &self.file.input
    }

    /// Builtin defaults plus every valid `[[map]]` entry.
    pub fn keymaps(&self) -> Keymaps {
        let mut builder = KeymapsBuilder::with_defaults();
        for (index, entry) in self.file.map.iter().enumerate() {
            if let Err(e) = entry.apply(&mut builder) {
                warn!(
                    target: "config",
                    index,
                    lhs = %entry.describe(),
                    error = %e,
                    "map_entry_skipped"
                );
            }
        }
        builder.build()
    }
}
