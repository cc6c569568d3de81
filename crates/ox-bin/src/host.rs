//! Host that prints what the engine hands it as JSON lines.

use core_actions::{CommandHost, Feedback, Invocation, Notice};
use core_state::Mode;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Line<'a> {
    Invocation(&'a Invocation),
    Notice(&'a Notice),
    Mode(Mode),
    Feedback(&'a Feedback),
    Undo(&'static str),
}

pub struct JsonHost<W: Write> {
    out: W,
    file_type: Option<String>,
    /// `\r\n` while the terminal is in raw mode.
    line_end: &'static str,
}

impl<W: Write> JsonHost<W> {
    pub fn new(out: W, file_type: Option<String>) -> Self {
        Self {
            out,
            file_type,
            line_end: "\n",
        }
    }

    pub fn raw_mode(mut self) -> Self {
        self.line_end = "\r\n";
        self
    }

    pub fn feedback(&mut self, feedback: &Feedback) {
        self.emit(&Line::Feedback(feedback));
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &Line<'_>) {
        let written = serde_json::to_writer(&mut self.out, line)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(self.line_end.as_bytes()))
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            warn!(target: "runtime", error = %e, "output_write_failed");
        }
    }
}

impl<W: Write> CommandHost for JsonHost<W> {
    fn execute(&mut self, invocation: &Invocation) {
        self.emit(&Line::Invocation(invocation));
    }

    fn begin_undo_group(&mut self) {
        self.emit(&Line::Undo("begin"));
    }

    fn end_undo_group(&mut self) {
        self.emit(&Line::Undo("end"));
    }

    fn file_type(&self) -> Option<String> {
        self.file_type.clone()
    }

    fn mode_changed(&mut self, mode: Mode) {
        self.emit(&Line::Mode(mode));
    }

    fn notify(&mut self, notice: Notice) {
        self.emit(&Line::Notice(&notice));
    }
}
