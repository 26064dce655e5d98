//! Per-phase line parsers.
//!
//! The listener owns one parser per [`Phase`](crate::listener::Phase) and
//! forwards lines to whichever is active. A parser keeps only its own pending
//! state; everything it needs from the outside (sink, patterns, path
//! stripper, stats) comes in through a [`ParseContext`].

pub mod commandlet;
pub mod compiler;
pub(crate) mod content;
pub mod cook_stats;
pub mod data_validation;
pub mod default;
pub mod gauntlet;

pub use commandlet::CommandletParser;
pub use compiler::CompilerParser;
pub use cook_stats::CookStatsParser;
pub use data_validation::DataValidationParser;
pub use default::{BlockParser, DefaultParser};
pub use gauntlet::GauntletParser;

use crate::constants::BLOCK_DEFAULT;
use crate::message::{Message, MessageType};
use crate::path_stripper::PathStripper;
use crate::patterns::LogPatterns;
use crate::sink::LogSink;
use crate::stat_store::StatStore;
use anyhow::Result;

/// Borrowed view of everything a parser may touch while handling one call.
pub struct ParseContext<'a> {
    pub sink: &'a mut dyn LogSink,
    pub patterns: &'a LogPatterns,
    pub stripper: &'a PathStripper,
    pub stats: Option<&'a mut StatStore>,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        sink: &'a mut dyn LogSink,
        patterns: &'a LogPatterns,
        stripper: &'a PathStripper,
        stats: Option<&'a mut StatStore>,
    ) -> Self {
        ParseContext {
            sink,
            patterns,
            stripper,
            stats,
        }
    }

    pub fn message(&mut self, text: &str) -> Result<()> {
        self.sink.message(text)
    }

    /// Routes a finished message to `warning` or `error` by its type.
    pub fn diagnostic(&mut self, message: &Message) -> Result<()> {
        match message.kind {
            MessageType::Warning => self.sink.warning(message),
            MessageType::Error => self.sink.error(message),
        }
    }

    pub fn strip<'t>(&self, path: &'t str) -> &'t str {
        self.stripper.remove_root(path)
    }

    pub fn has_stats(&self) -> bool {
        self.stats.is_some()
    }

    pub fn stats(&mut self) -> Option<&mut StatStore> {
        self.stats.as_deref_mut()
    }
}

/// The plain behaviour every parser starts from: text in, text out.
///
/// Parsers that only care about some calls leave the rest to the trait's
/// default methods, which call straight into this.
pub struct Passthrough;

impl Passthrough {
    pub fn enter(cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if !text.trim().is_empty() {
            cx.message(text)?;
        }
        Ok(())
    }

    pub fn line(cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        cx.message(text)
    }

    pub fn error(cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        let message = Message::new(BLOCK_DEFAULT, "", MessageType::Error, "", text, "", 0);
        cx.sink.error(&message)
    }

    pub fn leave(cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if !text.trim().is_empty() {
            cx.message(text)?;
        }
        Ok(())
    }
}

/// One phase's line handling.
///
/// `on_enter` receives the line that triggered the phase (or "" when that
/// line belongs to the previous phase) plus a readable description.
/// `on_leave` must flush anything still pending; `text` is a trailing line
/// that belongs to this phase, or "".
pub trait PhaseParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, _description: &str) -> Result<()> {
        Passthrough::enter(cx, text)
    }

    fn process_line(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        Passthrough::line(cx, text)
    }

    /// A line from the process's error stream.
    fn process_error(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        Passthrough::error(cx, text)
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        Passthrough::leave(cx, text)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    struct Bare;
    impl PhaseParser for Bare {}

    #[test]
    fn passthrough_defaults_skip_blank_enter_and_leave() {
        let mut h = Harness::new();
        let mut p = Bare;
        p.on_enter(&mut h.cx(), "  ", "desc").unwrap();
        p.process_line(&mut h.cx(), "hello").unwrap();
        p.on_leave(&mut h.cx(), "").unwrap();
        assert_eq!(h.sink.events, vec![Event::Line("hello".into())]);
    }

    #[test]
    fn passthrough_error_lands_in_default_block() {
        let mut h = Harness::new();
        Bare.process_error(&mut h.cx(), "fatal: oops").unwrap();
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].block, BLOCK_DEFAULT);
        assert_eq!(msgs[0].kind, MessageType::Error);
        assert_eq!(msgs[0].text, "fatal: oops");
        assert_eq!(msgs[0].source, "");
    }
}
