//! core-keymap: command registry, mapping tables and the sequence resolver.
//!
//! Design principles:
//! - Pure and deterministic: a resolution depends only on the accumulated
//!   buffer, the mode and the file type.
//! - Builtins and user remaps are compiled per mode into tries, so prefix
//!   queries are a walk rather than a scan.
//! - Tables are built once through [`KeymapsBuilder`] and then shared
//!   read-only (`Arc<Keymaps>`).
//! - No side effects: logging only at TRACE for traversal steps, DEBUG for
//!   registrations.

pub mod command;
mod defaults;
pub mod resolve;
pub mod table;
mod trie;

pub use command::{
    Accept, CommandDescriptor, CommandFlags, CommandKind, CommandSpec, InputKind, Internal,
};
pub use resolve::{Lookup, Resolution};
pub use table::{Binding, Expansion, KeymapError, Keymaps, KeymapsBuilder, Remap, RemapOptions};
pub use trie::MappingTrie;
