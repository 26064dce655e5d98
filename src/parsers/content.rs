//! Multi-line engine diagnostics, shared by the commandlet and data
//! validation parsers.
//!
//! A `Source: Warning: text` line opens a message; following lines are
//! folded into it until a line shaped like another log entry arrives.
//! Callstack dumps run until their end marker instead.

use super::ParseContext;
use crate::message::{Message, MessageType};
use crate::patterns::group;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Warning,
    Error,
    Callstack,
}

/// The pieces of a `Source: Warning|Error: text` opening line.
pub(crate) struct DiagnosticLine<'t> {
    pub indent: usize,
    pub source: &'t str,
    pub level: &'t str,
    pub text: &'t str,
}

impl<'t> DiagnosticLine<'t> {
    pub fn parse(cx: &ParseContext<'_>, line: &'t str) -> Option<Self> {
        let caps = cx.patterns.content_diagnostic.captures(line)?;
        Some(DiagnosticLine {
            indent: group(&caps, 1).len(),
            source: group(&caps, 2),
            level: group(&caps, 3),
            text: group(&caps, 4),
        })
    }

    pub fn is_error(&self) -> bool {
        self.level == "Error"
    }

    /// `(asset, rest)` when the text is an `[AssetLog] <asset>.uasset: rest` body.
    pub fn asset_log(&self, cx: &ParseContext<'_>) -> Option<(&'t str, &'t str)> {
        let caps = cx.patterns.asset_log.captures(self.text)?;
        Some((group(&caps, 1), group(&caps, 2)))
    }
}

#[derive(Debug)]
struct PendingContent {
    kind: PendingKind,
    block: &'static str,
    source: String,
    text: String,
    indent: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ContentAccumulator {
    pending: Option<PendingContent>,
}

impl ContentAccumulator {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Opens a new message. `body` is the message text after any asset
    /// prefix has been taken off; `callstack` marks an error that opens a
    /// callstack dump.
    pub fn start(
        &mut self,
        block: &'static str,
        line: &DiagnosticLine<'_>,
        source: &str,
        body: &str,
        callstack: bool,
    ) {
        let kind = match (line.is_error(), callstack) {
            (false, _) => PendingKind::Warning,
            (true, false) => PendingKind::Error,
            (true, true) => PendingKind::Callstack,
        };
        self.pending = Some(PendingContent {
            kind,
            block,
            source: source.to_string(),
            text: body.to_string(),
            indent: line.indent,
        });
    }

    /// Offers `text` to the open message. Returns true when the line was
    /// absorbed; false means the caller still has to handle it.
    pub fn absorb(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<bool> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(false);
        };
        let patterns = cx.patterns;

        if pending.kind == PendingKind::Callstack {
            push_line(&mut pending.text, text);
            if patterns.callstack_end.is_match(text) {
                self.flush(cx)?;
            }
            return Ok(true);
        }

        match patterns.content_terminator.captures(text) {
            None => {
                push_line(&mut pending.text, text);
                Ok(true)
            }
            Some(caps) => {
                let body = group(&caps, 2);
                if patterns.script_call_stack.is_match(body) {
                    let folded = format!("{:indent$}{}", "", body, indent = pending.indent);
                    push_line(&mut pending.text, &folded);
                    return Ok(true);
                }
                self.flush(cx)?;
                Ok(false)
            }
        }
    }

    pub fn flush(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        let Some(p) = self.pending.take() else {
            return Ok(());
        };
        let kind = match p.kind {
            PendingKind::Warning => MessageType::Warning,
            PendingKind::Error | PendingKind::Callstack => MessageType::Error,
        };
        let message = Message::new(p.block, p.source, kind, "", p.text, "", p.indent);
        cx.diagnostic(&message)
    }
}

fn push_line(buf: &mut String, line: &str) {
    buf.push('\n');
    buf.push_str(line);
}
