//! Sequence resolution.
//!
//! Order of precedence for an accumulated buffer in one mode:
//! 1. exact user remap (file-type scope before unscoped),
//! 2. a visible user remap strictly extending the buffer ⇒ `Incomplete`
//!    (skipped for exact-only lookups),
//! 3. the builtin table, looked up by the bare name (register prefix and count
//!    stripped),
//! 4. `NotFound`.
//!
//! Buffers are token sequences, so `<lt>` (a single `<` key) can never be
//! mistaken for the start of a long name such as `<C-x>`.

use crate::command::CommandDescriptor;
use crate::table::{Binding, Keymaps, Remap, Track};
use core_events::{KeyToken, bare_command_name};
use core_state::Mode;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A strict prefix of at least one remap; wait for more input.
    Incomplete,
    OpenNamespace,
    OpenRegister,
    Remap(Arc<Remap>),
    Builtin(CommandDescriptor),
    NotFound,
}

/// Parameters of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<'a> {
    pub mode: Mode,
    pub file_type: Option<&'a str>,
    /// Consult user remaps. Off while feeding a non-recursive expansion.
    pub remaps: bool,
    /// Full-sequence check only: never report `Incomplete`.
    pub exact_only: bool,
}

impl<'a> Lookup<'a> {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            file_type: None,
            remaps: true,
            exact_only: false,
        }
    }

    pub fn file_type(mut self, file_type: Option<&'a str>) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn remaps(mut self, enabled: bool) -> Self {
        self.remaps = enabled;
        self
    }

    pub fn exact_only(mut self) -> Self {
        self.exact_only = true;
        self
    }
}

fn resolve_track<S: Clone + PartialEq + fmt::Debug>(
    track: &Track<S>,
    lookup: &Lookup<'_>,
    accumulated: &[S],
    bare: impl Fn(&[S]) -> &[S],
) -> Resolution {
    if accumulated.is_empty() {
        return Resolution::NotFound;
    }
    if lookup.remaps {
        if let Some(remap) = track
            .remaps
            .get(accumulated)
            .and_then(|slot| slot.lookup(lookup.file_type))
        {
            debug!(target: "input.map", mode = %lookup.mode, lhs = %remap.lhs, "remap_found");
            return Resolution::Remap(remap.clone());
        }
        if !lookup.exact_only
            && track
                .remaps
                .has_extension(accumulated, |slot| slot.lookup(lookup.file_type).is_some())
        {
            trace!(
                target: "input.map",
                mode = %lookup.mode,
                len = accumulated.len(),
                "remap_prefix"
            );
            return Resolution::Incomplete;
        }
    }
    match track.builtin.get(bare(accumulated)) {
        Some(Binding::Command(spec)) => {
            trace!(target: "input.map", mode = %lookup.mode, command = %spec.name, "builtin_found");
            Resolution::Builtin(CommandDescriptor::new(spec.clone()))
        }
        Some(Binding::OpenNamespace) => Resolution::OpenNamespace,
        Some(Binding::OpenRegister) => Resolution::OpenRegister,
        None => Resolution::NotFound,
    }
}

impl Keymaps {
    /// Resolve an accumulated key sequence.
    pub fn resolve_keys(&self, lookup: &Lookup<'_>, accumulated: &[KeyToken]) -> Resolution {
        match self.tables(lookup.mode) {
            Some(tables) => resolve_track(&tables.keys, lookup, accumulated, bare_command_name),
            None => Resolution::NotFound,
        }
    }

    /// Resolve an accumulated text-command sequence.
    pub fn resolve_text(&self, lookup: &Lookup<'_>, accumulated: &[String]) -> Resolution {
        match self.tables(lookup.mode) {
            Some(tables) => resolve_track(&tables.text, lookup, accumulated, |seq| seq),
            None => Resolution::NotFound,
        }
    }

    /// Whether a remap is bound to exactly `seq` (ignoring prefixes).
    pub fn has_remap(&self, lookup: &Lookup<'_>, seq: &[KeyToken]) -> bool {
        self.tables(lookup.mode).is_some_and(|tables| {
            tables
                .keys
                .remaps
                .get(seq)
                .and_then(|slot| slot.lookup(lookup.file_type))
                .is_some()
        })
    }

    /// Remaps visible in `mode` whose left-hand side strictly extends
    /// `prefix`, sorted by left-hand side.
    pub fn continuations(
        &self,
        mode: Mode,
        file_type: Option<&str>,
        prefix: &[KeyToken],
    ) -> Vec<Arc<Remap>> {
        let Some(tables) = self.tables(mode) else {
            return Vec::new();
        };
        let mut found: Vec<Arc<Remap>> = tables
            .keys
            .remaps
            .extensions(prefix)
            .into_iter()
            .filter_map(|(_, slot)| slot.lookup(file_type).cloned())
            .collect();
        found.sort_by(|a, b| a.lhs.cmp(&b.lhs));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Expansion, KeymapsBuilder, RemapOptions};
    use core_events::parse;
    use core_state::ModeSet;
    use pretty_assertions::assert_eq;

    fn keys(s: &str) -> Vec<KeyToken> {
        parse(s).expect("valid notation")
    }

    fn keymaps() -> Keymaps {
        let mut builder = KeymapsBuilder::with_defaults();
        builder
            .remap(
                ModeSet::NORMAL,
                "gx",
                Expansion::parse_keys("dd").unwrap(),
                RemapOptions::noremap(),
            )
            .unwrap()
            .remap(
                ModeSet::NORMAL,
                "<C-x>k",
                Expansion::parse_keys("k").unwrap(),
                RemapOptions::noremap(),
            )
            .unwrap()
            .remap(
                ModeSet::NORMAL,
                "Q",
                Expansion::parse_keys("gq").unwrap(),
                RemapOptions::noremap().file_type("rust"),
            )
            .unwrap()
            .remap(
                ModeSet::NORMAL,
                "Q",
                Expansion::parse_keys("@q").unwrap(),
                RemapOptions::recursive(),
            )
            .unwrap();
        builder.build()
    }

    fn builtin_name(res: &Resolution) -> Option<&str> {
        match res {
            Resolution::Builtin(cmd) => Some(cmd.name()),
            _ => None,
        }
    }

    #[test]
    fn user_remap_beats_builtin() {
        let km = keymaps();
        let res = km.resolve_keys(&Lookup::new(Mode::Normal), &keys("gx"));
        assert!(matches!(res, Resolution::Remap(r) if r.lhs == "gx"));
    }

    #[test]
    fn prefix_of_remap_is_incomplete() {
        let km = keymaps();
        assert_eq!(
            km.resolve_keys(&Lookup::new(Mode::Normal), &keys("<C-x>")),
            Resolution::Incomplete
        );
        // exact-only lookups fall through to builtins
        assert_eq!(
            km.resolve_keys(&Lookup::new(Mode::Normal).exact_only(), &keys("<C-x>")),
            Resolution::NotFound
        );
    }

    #[test]
    fn less_than_key_is_not_a_long_name_prefix() {
        let km = keymaps();
        assert_ne!(
            km.resolve_keys(&Lookup::new(Mode::Normal), &keys("<lt>")),
            Resolution::Incomplete
        );
    }

    #[test]
    fn file_type_scope_preferred() {
        let km = keymaps();
        let rust = km.resolve_keys(&Lookup::new(Mode::Normal).file_type(Some("rust")), &keys("Q"));
        let other = km.resolve_keys(&Lookup::new(Mode::Normal).file_type(Some("c")), &keys("Q"));
        match (rust, other) {
            (Resolution::Remap(a), Resolution::Remap(b)) => {
                assert_eq!(a.rhs.to_string(), "gq");
                assert_eq!(b.rhs.to_string(), "@q");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn builtin_lookup_uses_bare_name() {
        let km = keymaps();
        let res = km.resolve_keys(&Lookup::new(Mode::Normal), &keys("\"a3dd"));
        assert_eq!(builtin_name(&res), Some("delete"));
        let zero = km.resolve_keys(&Lookup::new(Mode::Normal), &keys("0"));
        assert_eq!(builtin_name(&zero), Some("line_start"));
    }

    #[test]
    fn disabled_remaps_reach_builtins() {
        let km = keymaps();
        let res = km.resolve_keys(&Lookup::new(Mode::Normal).remaps(false), &keys("g"));
        assert_eq!(res, Resolution::OpenNamespace);
    }

    #[test]
    fn register_prefix_and_unknown() {
        let km = keymaps();
        assert_eq!(
            km.resolve_keys(&Lookup::new(Mode::Normal), &keys("\"")),
            Resolution::OpenRegister
        );
        assert_eq!(
            km.resolve_keys(&Lookup::new(Mode::Normal), &keys("<f9>")),
            Resolution::NotFound
        );
        assert_eq!(km.resolve_keys(&Lookup::new(Mode::Normal), &[]), Resolution::NotFound);
    }

    #[test]
    fn text_track_resolves_command_names() {
        let km = keymaps();
        let res = km.resolve_text(&Lookup::new(Mode::Normal), &["word_forward".to_string()]);
        assert_eq!(builtin_name(&res), Some("word_forward"));
        assert_eq!(
            km.resolve_text(&Lookup::new(Mode::Normal), &["nonexistent".to_string()]),
            Resolution::NotFound
        );
    }

    #[test]
    fn continuations_list_visible_extensions() {
        let km = keymaps();
        let found: Vec<String> = km
            .continuations(Mode::Normal, None, &keys("<C-x>"))
            .iter()
            .map(|r| r.lhs.clone())
            .collect();
        assert_eq!(found, vec!["<C-x>k".to_string()]);
        assert!(km.continuations(Mode::Insert, None, &keys("g")).is_empty());
    }

    #[test]
    fn has_remap_is_exact() {
        let km = keymaps();
        assert!(km.has_remap(&Lookup::new(Mode::Normal), &keys("gx")));
        assert!(!km.has_remap(&Lookup::new(Mode::Normal), &keys("g")));
    }
}
