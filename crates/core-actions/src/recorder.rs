//! Macro recording and dot-repeat storage.

use crate::dispatcher::VisualExtent;
use crate::invocation::Invocation;
use crate::pending::RecordedUnit;
use core_events::{InputUnit, KeyToken};
use core_state::{MacroSlot, Mode, is_writable_register};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

/// One recorded command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroCommand {
    pub invocation: Invocation,
    /// Mode the command switched to, if any.
    pub enters: Option<Mode>,
    /// A motion that ran without an operator.
    pub lone_motion: bool,
}

/// One step of a macro.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroStep {
    /// A command committed on its own.
    Command(MacroCommand),
    /// The commands of a glued batch, committed as one change and replayed
    /// inside one undo group.
    Batch(Vec<MacroCommand>),
}

impl MacroStep {
    /// The step for the commands of one glued batch. A single command stays
    /// a plain step.
    pub fn merged(mut commands: Vec<MacroCommand>) -> Option<Self> {
        match commands.len() {
            0 => None,
            1 => commands.pop().map(MacroStep::Command),
            _ => Some(MacroStep::Batch(commands)),
        }
    }

    pub fn commands(&self) -> &[MacroCommand] {
        match self {
            MacroStep::Command(command) => std::slice::from_ref(command),
            MacroStep::Batch(commands) => commands,
        }
    }
}

#[derive(Debug)]
struct Recording {
    name: char,
    steps: Vec<MacroStep>,
}

#[derive(Debug, Default)]
pub struct MacroRecorder {
    macros: HashMap<char, Vec<MacroStep>>,
    recording: Option<Recording>,
    last_replayed: Option<char>,
}

impl MacroRecorder {
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn recording_register(&self) -> Option<char> {
        self.recording.as_ref().map(|r| r.name)
    }

    /// Start recording. An appending slot starts from the existing macro.
    pub fn start(&mut self, slot: MacroSlot) {
        let steps = if slot.append {
            self.macros.get(&slot.name).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };
        debug!(
            target: "input.macro",
            register = %slot.name,
            append = slot.append,
            "recording_started"
        );
        self.recording = Some(Recording {
            name: slot.name,
            steps,
        });
    }

    pub fn record(&mut self, steps: impl IntoIterator<Item = MacroStep>) {
        if let Some(rec) = self.recording.as_mut() {
            rec.steps.extend(steps);
        }
    }

    /// Stop recording. Non-empty steps replace the macro; an empty recording
    /// deletes it. Returns the register and the number of steps kept.
    pub fn stop(&mut self) -> Option<(char, usize)> {
        let rec = self.recording.take()?;
        let len = rec.steps.len();
        if rec.steps.is_empty() {
            self.macros.remove(&rec.name);
        } else {
            self.macros.insert(rec.name, rec.steps);
        }
        debug!(target: "input.macro", register = %rec.name, steps = len, "recording_stopped");
        Some((rec.name, len))
    }

    pub fn get(&self, name: char) -> Option<&[MacroStep]> {
        self.macros.get(&name.to_ascii_lowercase()).map(Vec::as_slice)
    }

    /// Resolve the register named after `@` (`@` meaning the last replayed
    /// macro) and remember it as the last replayed one.
    pub fn replay_target(&mut self, name: char) -> Option<char> {
        let target = if name == '@' {
            self.last_replayed?
        } else if is_writable_register(name) {
            name.to_ascii_lowercase()
        } else {
            return None;
        };
        self.last_replayed = Some(target);
        Some(target)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The last repeatable commit.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatRecord {
    /// Name of the command that made the record.
    pub origin: String,
    pub payload: Vec<RecordedUnit>,
    pub mode: Mode,
    pub visual_extent: Option<VisualExtent>,
}

impl RepeatRecord {
    /// The payload with its leading count replaced by `count`. A leading
    /// register selection is kept in front of the new count.
    pub fn payload_with_count(&self, count: Option<u32>) -> Vec<RecordedUnit> {
        let Some(count) = count else {
            return self.payload.clone();
        };
        let mut rest = self.payload.as_slice();
        let mut out = Vec::new();
        if rest.len() >= 2 && leading_key(rest) == Some(&KeyToken::Char('"')) {
            out.extend_from_slice(&rest[..2]);
            rest = &rest[2..];
        }
        if leading_key(rest).and_then(KeyToken::digit).is_some_and(|d| d != 0) {
            let digits = rest
                .iter()
                .take_while(|u| u.unit.key().and_then(KeyToken::digit).is_some())
                .count();
            rest = &rest[digits..];
        }
        out.extend(
            count
                .to_string()
                .chars()
                .map(|c| RecordedUnit::noremap(InputUnit::Key(KeyToken::Char(c)))),
        );
        out.extend_from_slice(rest);
        out
    }
}

fn leading_key(units: &[RecordedUnit]) -> Option<&KeyToken> {
    units.first().and_then(|u| u.unit.key())
}

/// Holds the last repeatable commit. A record whose command entered an
/// insert-like mode stays open: commits typed in that mode extend its payload
/// until one leaves it, so the whole insertion repeats as one change.
#[derive(Debug, Default)]
pub struct RepeatStore {
    last: Option<RepeatRecord>,
    open: bool,
}

impl RepeatStore {
    pub fn store(&mut self, record: RepeatRecord, open: bool) {
        debug!(
            target: "input.repeat",
            origin = %record.origin,
            units = record.payload.len(),
            mode = %record.mode,
            open,
            "repeat_stored"
        );
        self.last = Some(record);
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open && self.last.is_some()
    }

    /// Append to an open record, closing it when `close` is set.
    pub fn extend(&mut self, units: impl IntoIterator<Item = RecordedUnit>, close: bool) {
        if !self.is_open() {
            return;
        }
        if let Some(record) = self.last.as_mut() {
            record.payload.extend(units);
        }
        if close {
            trace!(target: "input.repeat", "repeat_closed");
            self.open = false;
        }
    }

    pub fn last(&self) -> Option<&RepeatRecord> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
        self.open = false;
    }
}
