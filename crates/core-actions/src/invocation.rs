//! Command invocation contract.
//!
//! The engine hands the host a command name plus a JSON argument object.
//! `args` always carries `mode` and `count`; operators add `register`;
//! commands that collected input add it under their input argument. When an
//! operator runs with a motion, the motion's invocation is nested under the
//! operator's `args.motion` with its `mode` forced to `internal_normal`.

use core_keymap::{CommandDescriptor, CommandFlags, CommandKind, InputKind};
use core_state::Mode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Register used when none was selected.
pub const UNNAMED_REGISTER: char = '"';

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub name: String,
    pub args: Map<String, Value>,
    /// Capability flags of the command, for the host (undo glue, desired
    /// column, scrolling). Not part of the wire form.
    #[serde(skip)]
    pub flags: CommandFlags,
}

impl Invocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
            flags: CommandFlags::empty(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    pub fn count(&self) -> u64 {
        self.arg("count").and_then(Value::as_u64).unwrap_or(1)
    }

    pub fn mode(&self) -> Option<Mode> {
        self.arg("mode").and_then(Value::as_str).and_then(Mode::from_name)
    }

    pub fn register(&self) -> Option<char> {
        self.arg("register")
            .and_then(Value::as_str)
            .and_then(|s| s.chars().next())
    }

    /// The nested motion of a merged operator invocation.
    pub fn motion(&self) -> Option<(&str, &Map<String, Value>)> {
        let nested = self.arg("motion")?.as_object()?;
        let name = nested.get("name")?.as_str()?;
        let args = nested.get("args")?.as_object()?;
        Some((name, args))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, Value::Object(self.args.clone()))
    }
}

/// Translate a resolved command into its invocation.
pub fn translate(
    cmd: &CommandDescriptor,
    mode: Mode,
    count: u32,
    register: Option<char>,
) -> Invocation {
    let spec = cmd.spec();
    let mut args = spec.preset.clone();
    args.insert("mode".into(), mode.name().into());
    args.insert("count".into(), count.into());
    if spec.kind == CommandKind::Operator {
        args.insert(
            "register".into(),
            register.unwrap_or(UNNAMED_REGISTER).to_string().into(),
        );
    }
    if spec.input != InputKind::None {
        args.insert(spec.input_arg.into(), cmd.input().into());
    }
    Invocation {
        name: spec.name.clone(),
        args,
        flags: spec.flags,
    }
}

/// Nest `motion` under `operator.args.motion`.
pub fn merge(mut operator: Invocation, mut motion: Invocation) -> Invocation {
    motion
        .args
        .insert("mode".into(), Mode::InternalNormal.name().into());
    let mut nested = Map::new();
    nested.insert("name".into(), motion.name.into());
    nested.insert("args".into(), Value::Object(motion.args));
    operator.args.insert("motion".into(), Value::Object(nested));
    operator
}
