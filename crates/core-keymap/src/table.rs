//! Per-mode mapping tables and their builder.
//!
//! Each mode owns two tracks of the same shape: key sequences and text-command
//! names. A track holds the builtin registrations and the user remap overlay,
//! both compiled into a [`MappingTrie`]. Remap slots keep one unscoped entry
//! plus one entry per file type.

use crate::command::CommandSpec;
use crate::trie::MappingTrie;
use core_events::{InputUnit, KeyToken, NotationError, join, parse};
use core_state::{Mode, ModeSet};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

#[derive(Debug, thiserror::Error)]
pub enum KeymapError {
    #[error("invalid key notation in '{lhs}': {source}")]
    Notation { lhs: String, source: NotationError },
    #[error("empty left-hand side")]
    EmptyLhs,
    #[error("mapping for '{0}' names no modes")]
    NoModes(String),
}

/// Builtin table entry.
#[derive(Debug, Clone)]
pub enum Binding {
    Command(Arc<CommandSpec>),
    /// Strict prefix of longer builtins (`g`, `z`, `<C-w>`).
    OpenNamespace,
    /// Register selection prefix (`"`).
    OpenRegister,
}

/// Right-hand side of a remap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Keys(Vec<KeyToken>),
    Text(Vec<String>),
}

impl Expansion {
    pub fn parse_keys(notation: &str) -> Result<Self, NotationError> {
        parse(notation).map(Expansion::Keys)
    }

    pub fn text<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expansion::Text(names.into_iter().map(Into::into).collect())
    }

    pub fn units(&self) -> Vec<InputUnit> {
        match self {
            Expansion::Keys(keys) => keys.iter().cloned().map(InputUnit::Key).collect(),
            Expansion::Text(names) => names.iter().cloned().map(InputUnit::Text).collect(),
        }
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expansion::Keys(keys) => f.write_str(&join(keys)),
            Expansion::Text(names) => {
                for name in names {
                    write!(f, "[{name}]")?;
                }
                Ok(())
            }
        }
    }
}

/// A user remap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    /// Canonical notation (key track) or command name (text track).
    pub lhs: String,
    pub rhs: Expansion,
    /// `map` (true) or `noremap` (false).
    pub recursive: bool,
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemapOptions {
    pub recursive: bool,
    pub file_type: Option<String>,
}

impl RemapOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            file_type: None,
        }
    }

    pub fn noremap() -> Self {
        Self::default()
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RemapSlot {
    unscoped: Option<Arc<Remap>>,
    scoped: HashMap<String, Arc<Remap>>,
}

impl RemapSlot {
    /// File-type-scoped entry first, unscoped fallback second.
    pub(crate) fn lookup(&self, file_type: Option<&str>) -> Option<&Arc<Remap>> {
        file_type
            .and_then(|ft| self.scoped.get(ft))
            .or(self.unscoped.as_ref())
    }

    fn set(&mut self, remap: Arc<Remap>) {
        let replaced = match &remap.file_type {
            Some(ft) => self.scoped.insert(ft.clone(), remap.clone()),
            None => self.unscoped.replace(remap.clone()),
        };
        if replaced.is_some() {
            trace!(target: "input.map", lhs = %remap.lhs, "remap_override");
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Track<S> {
    pub(crate) builtin: MappingTrie<S, Binding>,
    pub(crate) remaps: MappingTrie<S, RemapSlot>,
}

impl<S> Default for Track<S> {
    fn default() -> Self {
        Self {
            builtin: MappingTrie::default(),
            remaps: MappingTrie::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ModeTables {
    pub(crate) keys: Track<KeyToken>,
    pub(crate) text: Track<String>,
}

/// Compiled, read-only mapping tables for every mode.
#[derive(Debug, Clone, Default)]
pub struct Keymaps {
    pub(crate) modes: HashMap<Mode, ModeTables>,
}

impl Keymaps {
    /// Builtin defaults with no user remaps.
    pub fn defaults() -> Self {
        KeymapsBuilder::with_defaults().build()
    }

    pub fn builder() -> KeymapsBuilder {
        KeymapsBuilder::new()
    }

    pub(crate) fn tables(&self, mode: Mode) -> Option<&ModeTables> {
        self.modes.get(&mode)
    }
}

/// Collects registrations, then compiles them into [`Keymaps`].
#[derive(Debug, Default)]
pub struct KeymapsBuilder {
    modes: HashMap<Mode, ModeTables>,
}

impl KeymapsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the builtin command set.
    pub fn with_defaults() -> Self {
        let mut builder = Self::new();
        if let Err(err) = crate::defaults::register(&mut builder) {
            error!(target: "input.map", error = %err, "default_registration_failed");
        }
        builder
    }

    fn checked_modes(modes: ModeSet, lhs: &str) -> Result<Vec<Mode>, KeymapError> {
        if lhs.is_empty() {
            return Err(KeymapError::EmptyLhs);
        }
        let modes: Vec<Mode> = modes.modes().collect();
        if modes.is_empty() {
            return Err(KeymapError::NoModes(lhs.to_string()));
        }
        Ok(modes)
    }

    fn parse_lhs(lhs: &str) -> Result<Vec<KeyToken>, KeymapError> {
        parse(lhs).map_err(|source| KeymapError::Notation {
            lhs: lhs.to_string(),
            source,
        })
    }

    /// Register a builtin command under each key sequence in `keys`, for every
    /// mode in `modes`. The command name also becomes a text-command in those
    /// modes unless it is already bound there or the `CommandSpec` carries presets.
    pub fn command(
        &mut self,
        modes: ModeSet,
        keys: &[&str],
        spec: CommandSpec,
    ) -> Result<&mut Self, KeymapError> {
        let spec = Arc::new(spec);
        let modes = Self::checked_modes(modes, &spec.name)?;
        for lhs in keys {
            let seq = Self::parse_lhs(lhs)?;
            if seq.is_empty() {
                return Err(KeymapError::EmptyLhs);
            }
            for mode in &modes {
                let tables = self.modes.entry(*mode).or_default();
                tables.keys.builtin.insert(&seq, Binding::Command(spec.clone()));
            }
        }
        if spec.preset.is_empty() {
            let name = [spec.name.clone()];
            for mode in &modes {
                let text = &mut self.modes.entry(*mode).or_default().text.builtin;
                if text.get(&name).is_none() {
                    text.insert(&name, Binding::Command(spec.clone()));
                }
            }
        }
        Ok(self)
    }

    /// Bind a key sequence to a non-command builtin entry.
    pub fn binding(
        &mut self,
        modes: ModeSet,
        lhs: &str,
        binding: Binding,
    ) -> Result<&mut Self, KeymapError> {
        let modes = Self::checked_modes(modes, lhs)?;
        let seq = Self::parse_lhs(lhs)?;
        for mode in modes {
            self.modes.entry(mode).or_default().keys.builtin.insert(&seq, binding.clone());
        }
        Ok(self)
    }

    /// Add a key-sequence remap.
    pub fn remap(
        &mut self,
        modes: ModeSet,
        lhs: &str,
        rhs: Expansion,
        options: RemapOptions,
    ) -> Result<&mut Self, KeymapError> {
        let modes = Self::checked_modes(modes, lhs)?;
        let seq = Self::parse_lhs(lhs)?;
        if seq.is_empty() {
            return Err(KeymapError::EmptyLhs);
        }
        let remap = Arc::new(Remap {
            lhs: join(&seq),
            rhs,
            recursive: options.recursive,
            file_type: options.file_type,
        });
        debug!(
            target: "input.map",
            lhs = %remap.lhs,
            rhs = %remap.rhs,
            recursive = remap.recursive,
            file_type = ?remap.file_type,
            "remap_added"
        );
        for mode in modes {
            let tables = self.modes.entry(mode).or_default();
            tables.keys.remaps.get_or_insert_with(&seq, RemapSlot::default).set(remap.clone());
        }
        Ok(self)
    }

    /// Add a text-command remap.
    pub fn remap_text(
        &mut self,
        modes: ModeSet,
        name: &str,
        rhs: Expansion,
        options: RemapOptions,
    ) -> Result<&mut Self, KeymapError> {
        let modes = Self::checked_modes(modes, name)?;
        let remap = Arc::new(Remap {
            lhs: name.to_string(),
            rhs,
            recursive: options.recursive,
            file_type: options.file_type,
        });
        debug!(
            target: "input.map",
            lhs = %remap.lhs,
            rhs = %remap.rhs,
            recursive = remap.recursive,
            "text_remap_added"
        );
        let seq = [name.to_string()];
        for mode in modes {
            let tables = self.modes.entry(mode).or_default();
            tables.text.remaps.get_or_insert_with(&seq, RemapSlot::default).set(remap.clone());
        }
        Ok(self)
    }

    /// Compile. Unbound strict prefixes of builtin key sequences become
    /// namespace entries.
    pub fn build(mut self) -> Keymaps {
        for (mode, tables) in &mut self.modes {
            let filled = tables.keys.builtin.fill_prefixes(|| Binding::OpenNamespace);
            trace!(
                target: "input.map",
                %mode,
                namespaces = filled,
                builtins = tables.keys.builtin.len(),
                remaps = tables.keys.remaps.len(),
                "mode_compiled"
            );
        }
        Keymaps { modes: self.modes }
    }
}
