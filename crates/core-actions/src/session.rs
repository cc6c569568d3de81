//! Process-wide engine state shared by every surface.

use crate::recorder::{MacroRecorder, RepeatStore};
use core_config::{Config, InputConfig};
use core_keymap::Keymaps;
use std::sync::Arc;
use tracing::info;

/// Mapping tables, settings, macros and the repeat record. Surfaces each own
/// an [`InputController`](crate::InputController) and borrow the session per
/// unit.
#[derive(Debug)]
pub struct Session {
    keymaps: Arc<Keymaps>,
    settings: InputConfig,
    macros: MacroRecorder,
    repeat: RepeatStore,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Keymaps::defaults(), InputConfig::default())
    }
}

impl Session {
    pub fn new(keymaps: Keymaps, settings: InputConfig) -> Self {
        Self {
            keymaps: Arc::new(keymaps),
            settings,
            macros: MacroRecorder::default(),
            repeat: RepeatStore::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.keymaps(), config.input().clone())
    }

    pub fn keymaps(&self) -> &Arc<Keymaps> {
        &self.keymaps
    }

    pub fn settings(&self) -> &InputConfig {
        &self.settings
    }

    pub fn macros(&self) -> &MacroRecorder {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroRecorder {
        &mut self.macros
    }

    pub fn repeat(&self) -> &RepeatStore {
        &self.repeat
    }

    pub fn repeat_mut(&mut self) -> &mut RepeatStore {
        &mut self.repeat
    }

    /// Swap in new tables and settings. Recorded macros and the repeat record
    /// refer to the old tables and are dropped.
    pub fn reload(&mut self, keymaps: Keymaps, settings: InputConfig) {
        self.keymaps = Arc::new(keymaps);
        self.settings = settings;
        self.macros.clear();
        self.repeat.clear();
        info!(target: "input.controller", "session_reloaded");
    }
}
