//! Input capture controller.
//!
//! Drives one surface. Each unit passes, in order: escape abort, selection
//! coercion, register capture, input collection for a staged command, the
//! count shortcut, and finally the resolver. Resolved builtins are staged on
//! the composer and committed to the host once runnable.
//!
//! Multi-unit input (remap expansions, notation strings, dot-repeat payloads,
//! macro replays) runs as a batch. Leading lone motions of a batch run on
//! their own; from the first other commit on, the batch shares one undo group
//! and its units become the repeat payload. Macro steps committed inside a
//! batch reach the recorder only when the batch completes, the grouped suffix
//! as one merged step.
//!
//! Units waiting to be processed sit on a queue owned by the controller.
//! Remap expansions and repeat payloads are pushed to its front, so nesting
//! is bounded by `max_map_depth` and never by the call stack.

use crate::composer::{self, Evaluation, Precondition};
use crate::dispatcher::{self, CommandHost, Notice, UndoGlue, VisualExtent};
use crate::invocation::Invocation;
use crate::pending::{PendingState, RecordedUnit};
use crate::recorder::{MacroCommand, MacroStep, RepeatRecord};
use crate::session::Session;
use core_events::{InputUnit, KeyToken, NotationError, join, parse};
use core_keymap::{
    Accept, CommandDescriptor, InputKind, Internal, Keymaps, Lookup, Remap, Resolution,
};
use core_state::{Mode, is_readable_register, macro_slot};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Name of the text command that receives unmapped printable input.
const INSERT_COMMAND: &str = "insert";

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Precondition(#[from] Precondition),
    #[error(transparent)]
    Notation(#[from] NotationError),
    #[error("remap expansion nested deeper than {0}")]
    MapDepth(u32),
}

/// What the surface is waiting for after a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PendingStatus {
    Idle,
    /// Part of a command has been typed; `buffered` units so far.
    AwaitingMore { buffered: usize },
    /// A staged command is collecting input. `prompt` is set for line input.
    CollectingInput { prompt: bool },
    AwaitingRegister,
    OperatorPending,
}

/// Result of one `feed` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub status: PendingStatus,
    pub mode: Mode,
    /// Invocations handed to the host while processing the input.
    pub dispatched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    Keys,
    Replay,
}

#[derive(Debug)]
struct RepeatStart {
    origin: String,
    mode: Mode,
    visual_extent: Option<VisualExtent>,
}

#[derive(Debug)]
struct Batch {
    kind: BatchKind,
    suffix_started: bool,
    suffix: Vec<RecordedUnit>,
    /// First repeatable commit of the suffix.
    repeat: Option<RepeatStart>,
    /// The suffix holds commits typed in an insert-like mode.
    text_entry: bool,
    /// Recorded commands that ran before the suffix.
    macro_lead: Vec<MacroStep>,
    /// Recorded commands of the suffix.
    macro_glued: Vec<MacroCommand>,
}

impl Batch {
    fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            suffix_started: false,
            suffix: Vec::new(),
            repeat: None,
            text_entry: false,
            macro_lead: Vec::new(),
            macro_glued: Vec::new(),
        }
    }

    fn take_macro_steps(&mut self) -> Vec<MacroStep> {
        let mut steps = std::mem::take(&mut self.macro_lead);
        steps.extend(MacroStep::merged(std::mem::take(&mut self.macro_glued)));
        steps
    }

    fn clear_macro_steps(&mut self) {
        self.macro_lead.clear();
        self.macro_glued.clear();
    }
}

/// A unit waiting to be processed, with the remap nesting it came from.
#[derive(Debug)]
struct Queued {
    unit: RecordedUnit,
    depth: u32,
}

#[derive(Debug, Default)]
pub struct InputController {
    pending: PendingState,
    /// Mode in which the current command sequence started.
    sequence_mode: Mode,
    /// Remap nesting of the unit being processed.
    depth: u32,
    queue: VecDeque<Queued>,
    batch: Option<Batch>,
    dispatched: usize,
}

impl InputController {
    pub fn new(mode: Mode) -> Self {
        Self {
            pending: PendingState::new(mode),
            sequence_mode: mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.pending.mode
    }

    pub fn pending(&self) -> &PendingState {
        &self.pending
    }

    /// Mode change made by the host. Drops anything pending.
    pub fn set_mode(&mut self, mode: Mode) {
        self.pending.reset();
        self.pending.mode = mode;
    }

    /// Drop anything pending, keeping the mode.
    pub fn reset(&mut self) {
        self.pending.reset();
    }

    pub fn status(&self) -> PendingStatus {
        let p = &self.pending;
        if p.capturing_register {
            return PendingStatus::AwaitingRegister;
        }
        if let Some(cmd) = p.collecting() {
            return PendingStatus::CollectingInput {
                prompt: cmd.spec().input == InputKind::Line,
            };
        }
        if p.partial_keys.is_empty()
            && p.partial_text.is_empty()
            && p.operator.is_some()
            && p.mode == Mode::OperatorPending
        {
            return PendingStatus::OperatorPending;
        }
        if p.is_idle() {
            PendingStatus::Idle
        } else {
            PendingStatus::AwaitingMore {
                buffered: p.sequence.len(),
            }
        }
    }

    /// Process one interactively typed unit.
    pub fn feed(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        unit: InputUnit,
    ) -> Result<Feedback, InputError> {
        self.begin_feed();
        self.push_front(vec![RecordedUnit::new(unit)], 0);
        let result = self.drain(session, host, 0);
        self.finish(host, result)
    }

    /// Process several units as one batch.
    pub fn feed_batch<I>(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        units: I,
    ) -> Result<Feedback, InputError>
    where
        I: IntoIterator<Item = InputUnit>,
    {
        self.begin_feed();
        let units = units.into_iter().map(RecordedUnit::new).collect();
        let result = self.run_batch(session, host, units, 0);
        self.finish(host, result)
    }

    /// Tokenize `notation` and process it as one batch.
    pub fn feed_notation(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        notation: &str,
    ) -> Result<Feedback, InputError> {
        let keys = parse(notation)?;
        self.feed_batch(session, host, keys.into_iter().map(InputUnit::Key))
    }

    fn begin_feed(&mut self) {
        self.dispatched = 0;
        self.depth = 0;
        self.queue.clear();
    }

    fn finish(
        &mut self,
        host: &mut dyn CommandHost,
        result: Result<(), InputError>,
    ) -> Result<Feedback, InputError> {
        self.batch = None;
        self.queue.clear();
        match result {
            Ok(()) => {}
            Err(InputError::MapDepth(limit)) => {
                warn!(target: "input.map", limit, "remap_depth_exceeded");
                self.abort(host);
                host.notify(Notice::Error {
                    message: InputError::MapDepth(limit).to_string(),
                });
            }
            Err(e) => {
                error!(
                    target: "input.controller",
                    error = %e,
                    mode = %self.pending.mode,
                    "input_aborted"
                );
                self.abort(host);
                return Err(e);
            }
        }
        Ok(self.feedback())
    }

    fn feedback(&self) -> Feedback {
        Feedback {
            status: self.status(),
            mode: self.pending.mode,
            dispatched: self.dispatched,
        }
    }

    /// Queue `units` ahead of everything already waiting.
    fn push_front(&mut self, units: Vec<RecordedUnit>, depth: u32) {
        for unit in units.into_iter().rev() {
            self.queue.push_front(Queued { unit, depth });
        }
    }

    /// Process queued units until only the `base` oldest remain.
    fn drain(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        base: usize,
    ) -> Result<(), InputError> {
        while self.queue.len() > base {
            let Some(next) = self.queue.pop_front() else {
                break;
            };
            self.depth = next.depth;
            self.process(session, host, next.unit)?;
        }
        Ok(())
    }

    fn process(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        unit: RecordedUnit,
    ) -> Result<(), InputError> {
        trace!(
            target: "input.controller",
            unit = %unit.unit,
            mode = %self.pending.mode,
            remaps = unit.remaps,
            "unit"
        );
        if unit.unit.is_escape() && !self.pending.is_idle() {
            debug!(target: "input.controller", "escape_abort");
            self.abort(host);
            return Ok(());
        }
        self.coerce_mode(host);
        if self.pending.sequence.is_empty() {
            self.sequence_mode = self.pending.mode;
        }
        self.pending.sequence.push(RecordedUnit::noremap(unit.unit.clone()));

        if self.pending.capturing_register {
            self.capture_register(host, &unit.unit);
            return Ok(());
        }
        if let Some(cmd) = self.pending.collecting_mut() {
            return match cmd.accept(&unit.unit) {
                Accept::Taken => self.try_run(session, host),
                Accept::Abandoned => {
                    debug!(target: "input.context", "collection_abandoned");
                    self.abort(host);
                    Ok(())
                }
            };
        }
        if let Some(digit) = self.count_digit(&unit.unit) {
            self.pending.push_digit(digit);
            return Ok(());
        }
        self.resolve(session, host, unit)?;
        if self.pending.is_idle() {
            self.pending.sequence.clear();
        }
        Ok(())
    }

    /// A bare digit that extends a count: non-zero, or zero while a count is
    /// accumulating.
    fn count_digit(&self, unit: &InputUnit) -> Option<char> {
        let p = &self.pending;
        if !p.mode.accepts_counts() || !p.partial_keys.is_empty() {
            return None;
        }
        let c = unit.key()?.as_char()?;
        let digit = c.to_digit(10)?;
        (digit != 0 || p.count_in_progress()).then_some(c)
    }

    fn capture_register(&mut self, host: &mut dyn CommandHost, unit: &InputUnit) {
        self.pending.capturing_register = false;
        let name = unit
            .key()
            .and_then(KeyToken::as_char)
            .filter(|c| is_readable_register(*c));
        match name {
            Some(name) => {
                trace!(target: "input.context", register = %name, "register_captured");
                self.pending.register = Some(name);
            }
            None => self.reject(host),
        }
    }

    fn resolve(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        unit: RecordedUnit,
    ) -> Result<(), InputError> {
        let keymaps = Arc::clone(session.keymaps());
        let file_type = host.file_type();
        let lookup = Lookup::new(self.pending.mode)
            .file_type(file_type.as_deref())
            .remaps(unit.remaps);
        let (resolution, buffered) = match &unit.unit {
            InputUnit::Key(key) => {
                self.pending.partial_keys.push(key.clone());
                let keys = &self.pending.partial_keys;
                (keymaps.resolve_keys(&lookup, keys), keys.len())
            }
            InputUnit::Text(name) => {
                self.pending.partial_text.push(name.clone());
                let names = &self.pending.partial_text;
                (keymaps.resolve_text(&lookup, names), names.len())
            }
        };
        // `g??` and friends: the doubled operator beats an operator-pending motion.
        if matches!(resolution, Resolution::Builtin(_))
            && let Some((cmd, keys)) = self.doubled_operator(&keymaps, &lookup)
        {
            return self.stage(session, host, cmd, keys);
        }
        match resolution {
            Resolution::Incomplete => {
                self.pending.awaiting_remap = true;
                Ok(())
            }
            Resolution::OpenNamespace => Ok(()),
            Resolution::OpenRegister => {
                self.pending.clear_partial();
                self.pending.capturing_register = true;
                Ok(())
            }
            Resolution::Remap(remap) => self.expand(session, host, &remap, buffered),
            Resolution::Builtin(cmd) => {
                let keys = self.pending.partial_keys.to_vec();
                self.stage(session, host, cmd, keys)
            }
            Resolution::NotFound => self.not_found(session, host, &keymaps, lookup, unit),
        }
    }

    fn expand(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        remap: &Remap,
        lhs_len: usize,
    ) -> Result<(), InputError> {
        self.pending.clear_partial();
        let keep = self.pending.sequence.len().saturating_sub(lhs_len);
        self.pending.sequence.truncate(keep);
        let limit = session.settings().max_map_depth;
        let depth = self.depth + 1;
        if depth > limit {
            return Err(InputError::MapDepth(limit));
        }
        debug!(
            target: "input.map",
            lhs = %remap.lhs,
            rhs = %remap.rhs,
            recursive = remap.recursive,
            depth,
            "remap_expanded"
        );
        let units = remap
            .rhs
            .units()
            .into_iter()
            .map(|unit| RecordedUnit {
                unit,
                remaps: remap.recursive,
            })
            .collect();
        self.run_batch(session, host, units, depth)
    }

    fn stage(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        cmd: CommandDescriptor,
        keys: Vec<KeyToken>,
    ) -> Result<(), InputError> {
        self.pending.clear_partial();
        // `q` ends a recording without waiting for a register name.
        if cmd.spec().internal == Some(Internal::ToggleMacro) && session.macros().is_recording() {
            self.pending.reset();
            self.stop_recording(session, host);
            return Ok(());
        }
        let before = self.pending.mode;
        composer::stage(&mut self.pending, cmd, &keys)?;
        if self.pending.mode != before {
            host.mode_changed(self.pending.mode);
        }
        if self.batch.is_none()
            && let Some(cmd) = self.pending.collecting()
            && cmd.spec().input == InputKind::Line
        {
            host.notify(Notice::Prompt {
                command: cmd.name().to_string(),
            });
        }
        self.try_run(session, host)
    }

    fn not_found(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        keymaps: &Keymaps,
        lookup: Lookup<'_>,
        unit: RecordedUnit,
    ) -> Result<(), InputError> {
        // A remap prefix that went nowhere: its first key runs unmapped, the
        // rest are fed again.
        if self.pending.awaiting_remap && self.pending.partial_keys.len() > 1 {
            let keys: Vec<KeyToken> = self.pending.partial_keys.to_vec();
            self.pending.clear_partial();
            let keep = self.pending.sequence.len().saturating_sub(keys.len());
            self.pending.sequence.truncate(keep);
            debug!(target: "input.map", buffered = keys.len(), "ambiguous_prefix_fallback");
            let units = keys
                .into_iter()
                .enumerate()
                .map(|(i, key)| RecordedUnit {
                    unit: InputUnit::Key(key),
                    remaps: i > 0 && unit.remaps,
                })
                .collect();
            self.push_front(units, self.depth);
            return Ok(());
        }

        if let Some((cmd, keys)) = self.doubled_operator(keymaps, &lookup) {
            return self.stage(session, host, cmd, keys);
        }

        if let Some(text) = self.unmapped_text(session) {
            return self.insert_text(session, host, keymaps, lookup, text);
        }
        self.reject(host);
        Ok(())
    }

    /// Doubled and counted operators (`dd`, `d2d`, `gugu`, `guu`, `g??`) are
    /// Normal-mode sequences that start with the staged operator's keys.
    /// Clears the staged operator when one matches.
    fn doubled_operator(
        &mut self,
        keymaps: &Keymaps,
        lookup: &Lookup<'_>,
    ) -> Option<(CommandDescriptor, Vec<KeyToken>)> {
        let p = &self.pending;
        if p.mode != Mode::OperatorPending || p.operator.is_none() || p.partial_keys.is_empty() {
            return None;
        }
        let mut keys = p.operator_keys.clone();
        keys.extend(p.partial_keys.iter().cloned());
        let retry = Lookup::new(Mode::Normal)
            .file_type(lookup.file_type)
            .remaps(false)
            .exact_only();
        let Resolution::Builtin(cmd) = keymaps.resolve_keys(&retry, &keys) else {
            return None;
        };
        debug!(target: "input.context", keys = %join(&keys), "operator_doubled");
        self.pending.operator = None;
        Some((cmd, keys))
    }

    /// Printable keys typed in a text-entry mode that nothing maps.
    fn unmapped_text(&self, session: &Session) -> Option<String> {
        let mode = self.pending.mode;
        let text_entry = mode.is_insert_like() || mode == Mode::Command;
        if !session.settings().insert_unmapped || !text_entry {
            return None;
        }
        self.pending
            .partial_keys
            .iter()
            .map(KeyToken::as_char)
            .collect::<Option<String>>()
            .filter(|text| !text.is_empty())
    }

    fn insert_text(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        keymaps: &Keymaps,
        lookup: Lookup<'_>,
        text: String,
    ) -> Result<(), InputError> {
        self.pending.clear_partial();
        let exact = Lookup {
            remaps: false,
            exact_only: true,
            ..lookup
        };
        let name = [INSERT_COMMAND.to_string()];
        let Resolution::Builtin(cmd) = keymaps.resolve_text(&exact, &name) else {
            self.reject(host);
            return Ok(());
        };
        composer::stage(&mut self.pending, cmd, &[])?;
        if !composer::is_runnable(&self.pending)? {
            return Ok(());
        }
        let sequence = std::mem::take(&mut self.pending.sequence);
        let sequence_mode = self.sequence_mode;
        let max_count = session.settings().max_count;
        let Some(mut eval) = composer::evaluate(&mut self.pending, max_count) else {
            return Ok(());
        };
        eval.invocation.args.insert("characters".into(), text.into());
        self.commit(session, host, eval, sequence, sequence_mode);
        Ok(())
    }

    fn try_run(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
    ) -> Result<(), InputError> {
        if !composer::is_runnable(&self.pending)? {
            return Ok(());
        }
        let sequence = std::mem::take(&mut self.pending.sequence);
        let sequence_mode = self.sequence_mode;
        let Some(eval) = composer::evaluate(&mut self.pending, session.settings().max_count) else {
            return Ok(());
        };
        match eval.internal {
            Some(Internal::ToggleMacro) => {
                self.start_recording(session, host, &eval);
                Ok(())
            }
            Some(Internal::ReplayMacro) => {
                self.replay_macro(session, host, &eval);
                Ok(())
            }
            Some(Internal::RepeatLast) => self.repeat_last(session, host, &eval),
            None => {
                self.commit(session, host, eval, sequence, sequence_mode);
                Ok(())
            }
        }
    }

    /// Execute an evaluation and update the repeat record.
    fn commit(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        eval: Evaluation,
        sequence: Vec<RecordedUnit>,
        sequence_mode: Mode,
    ) {
        let visual_extent = if sequence_mode.is_visual() {
            host.visual_extent()
        } else {
            None
        };
        let origin = eval.invocation.name.clone();
        let enters = (eval.next_mode != eval.origin_mode).then_some(eval.next_mode);
        let text_entry = eval.origin_mode.is_insert_like();
        let in_suffix = self.execute(session, host, eval.invocation, enters, eval.lone_motion);

        match self.batch.as_mut() {
            Some(batch) => {
                if !in_suffix {
                    return;
                }
                batch.suffix.extend(sequence);
                if text_entry {
                    batch.text_entry = true;
                } else if eval.repeatable && batch.repeat.is_none() {
                    batch.repeat = Some(RepeatStart {
                        origin,
                        mode: sequence_mode,
                        visual_extent,
                    });
                }
            }
            None if text_entry => {
                session
                    .repeat_mut()
                    .extend(sequence, !eval.next_mode.is_insert_like());
            }
            None if eval.repeatable => {
                let record = RepeatRecord {
                    origin,
                    payload: sequence,
                    mode: sequence_mode,
                    visual_extent,
                };
                session.repeat_mut().store(record, eval.next_mode.is_insert_like());
            }
            None => {}
        }
    }

    /// Hand one invocation to the host. Returns whether it belongs to the
    /// grouped suffix of the running batch.
    fn execute(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        invocation: Invocation,
        enters: Option<Mode>,
        lone_motion: bool,
    ) -> bool {
        let in_suffix = match self.batch.as_mut() {
            Some(batch) if batch.suffix_started || !lone_motion => {
                batch.suffix_started = true;
                host.begin_undo_group();
                true
            }
            _ => false,
        };
        dispatcher::dispatch(host, &invocation);
        self.dispatched += 1;
        if session.macros().is_recording() {
            let command = MacroCommand {
                invocation,
                enters,
                lone_motion,
            };
            match self.batch.as_mut() {
                Some(batch) if in_suffix => batch.macro_glued.push(command),
                Some(batch) => batch.macro_lead.push(MacroStep::Command(command)),
                None => session.macros_mut().record([MacroStep::Command(command)]),
            }
        }
        if let Some(mode) = enters {
            self.change_mode(host, mode);
        }
        in_suffix
    }

    /// Run `units` as a batch at remap nesting `depth`. Inside a running
    /// batch they are queued ahead of its remaining units.
    fn run_batch(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        units: Vec<RecordedUnit>,
        depth: u32,
    ) -> Result<(), InputError> {
        if self.batch.is_some() {
            self.push_front(units, depth);
            return Ok(());
        }
        trace!(target: "input.controller", units = units.len(), "batch_start");
        let base = self.queue.len();
        self.push_front(units, depth);
        self.batch = Some(Batch::new(BatchKind::Keys));
        let mut glue = UndoGlue::new(host);
        let result = self.drain(session, &mut glue, base);
        drop(glue);
        let batch = self.batch.take();
        if result.is_ok()
            && let Some(batch) = batch
        {
            self.close_batch(session, batch);
        }
        result
    }

    fn close_batch(&mut self, session: &mut Session, mut batch: Batch) {
        session.macros_mut().record(batch.take_macro_steps());
        if batch.kind == BatchKind::Replay {
            return;
        }
        let open = self.pending.mode.is_insert_like();
        if let Some(start) = batch.repeat {
            let record = RepeatRecord {
                origin: start.origin,
                payload: batch.suffix,
                mode: start.mode,
                visual_extent: start.visual_extent,
            };
            session.repeat_mut().store(record, open);
        } else if batch.text_entry {
            session.repeat_mut().extend(batch.suffix, !open);
        }
    }

    fn start_recording(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        eval: &Evaluation,
    ) {
        let Some(slot) = eval.input.chars().next().and_then(macro_slot) else {
            debug!(target: "input.macro", "recording_target_rejected");
            return;
        };
        if let Some(batch) = self.batch.as_mut() {
            batch.clear_macro_steps();
        }
        session.macros_mut().start(slot);
        host.notify(Notice::RecordingStarted { register: slot.name });
    }

    fn stop_recording(&mut self, session: &mut Session, host: &mut dyn CommandHost) {
        if let Some(batch) = self.batch.as_mut() {
            session.macros_mut().record(batch.take_macro_steps());
        }
        if let Some((register, steps)) = session.macros_mut().stop() {
            host.notify(Notice::RecordingStopped { register, steps });
        }
    }

    fn replay_macro(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        eval: &Evaluation,
    ) {
        let target = eval
            .input
            .chars()
            .next()
            .and_then(|name| session.macros_mut().replay_target(name));
        let steps = match target.and_then(|name| session.macros().get(name)) {
            Some(steps) if !steps.is_empty() => steps.to_vec(),
            _ => {
                self.reject(host);
                return;
            }
        };
        let times = if eval.count_typed { eval.count } else { 1 };
        debug!(target: "input.macro", steps = steps.len(), times, "macro_replay");

        let outer = self.batch.is_none();
        if outer {
            self.batch = Some(Batch::new(BatchKind::Replay));
        }
        let mut glue = UndoGlue::new(host);
        for _ in 0..times {
            for step in &steps {
                if matches!(step, MacroStep::Batch(_))
                    && let Some(batch) = self.batch.as_mut()
                {
                    batch.suffix_started = true;
                }
                for command in step.commands() {
                    let mut invocation = command.invocation.clone();
                    if let Some(register) = eval.register
                        && invocation.args.contains_key("register")
                    {
                        invocation
                            .args
                            .insert("register".into(), register.to_string().into());
                    }
                    self.execute(
                        session,
                        &mut glue,
                        invocation,
                        command.enters,
                        command.lone_motion,
                    );
                }
            }
        }
        drop(glue);
        if outer && let Some(batch) = self.batch.take() {
            self.close_batch(session, batch);
        }
    }

    fn repeat_last(
        &mut self,
        session: &mut Session,
        host: &mut dyn CommandHost,
        eval: &Evaluation,
    ) -> Result<(), InputError> {
        let Some(record) = session.repeat().last().cloned() else {
            self.reject(host);
            return Ok(());
        };
        let payload = record.payload_with_count(eval.count_typed.then_some(eval.count));
        debug!(
            target: "input.repeat",
            origin = %record.origin,
            units = payload.len(),
            "repeat_replay"
        );
        if record.mode.is_visual()
            && let Some(extent) = &record.visual_extent
        {
            host.restore_visual_extent(extent);
            self.change_mode(host, record.mode);
        }
        self.run_batch(session, host, payload, self.depth)
    }

    fn coerce_mode(&mut self, host: &mut dyn CommandHost) {
        let mode = self.pending.mode;
        match host.selection_state() {
            Some(true) if mode == Mode::Normal => self.change_mode(host, Mode::Visual),
            Some(false) if mode.is_visual() => self.change_mode(host, Mode::Normal),
            _ => {}
        }
    }

    fn change_mode(&mut self, host: &mut dyn CommandHost, mode: Mode) {
        if self.pending.mode != mode {
            debug!(
                target: "input.controller",
                from = %self.pending.mode,
                to = %mode,
                "mode_changed"
            );
            self.pending.mode = mode;
            host.mode_changed(mode);
        }
    }

    /// Full reset; operator-pending falls back to Normal.
    fn abort(&mut self, host: &mut dyn CommandHost) {
        self.pending.reset();
        if self.pending.mode == Mode::OperatorPending {
            self.change_mode(host, Mode::Normal);
        }
    }

    fn reject(&mut self, host: &mut dyn CommandHost) {
        debug!(target: "input.controller", mode = %self.pending.mode, "input_rejected");
        host.notify(Notice::Bell);
        self.abort(host);
    }
}
