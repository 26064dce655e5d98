//! Native compiler output (MSVC and clang shapes).
//!
//! A diagnostic can span several lines: `note:` follow-ups, deeply indented
//! continuation lines, an echoed source line with a caret under it, and an
//! `In file included from` chain printed before it.

use super::{ParseContext, Passthrough, PhaseParser};
use crate::constants::BLOCK_COMPILER;
use crate::message::{Message, MessageType};
use crate::patterns::group;
use anyhow::Result;

const INCLUDE_INTRO: &str = "In file included from";

#[derive(Debug)]
struct PendingDiagnostic {
    kind: MessageType,
    source: String,
    code: String,
    text: String,
    intro: String,
}

impl PendingDiagnostic {
    fn push(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
    }
}

#[derive(Debug, Default)]
pub struct CompilerParser {
    pending: Option<PendingDiagnostic>,
    intro: Vec<String>,
    /// A line held back to see whether a caret line follows it.
    stash: Option<String>,
    lookahead: bool,
}

impl CompilerParser {
    pub fn new() -> Self {
        CompilerParser::default()
    }

    fn start(&mut self, cx: &ParseContext<'_>, caps: &regex::Captures<'_>) {
        let kind = if group(caps, 3) == "warning" {
            MessageType::Warning
        } else {
            // "error" and "fatal error"
            MessageType::Error
        };
        self.pending = Some(PendingDiagnostic {
            kind,
            source: cx.strip(group(caps, 2)).to_string(),
            code: group(caps, 4).to_string(),
            text: group(caps, 5).to_string(),
            intro: self.intro.drain(..).collect::<Vec<_>>().join("\n"),
        });
        self.lookahead = true;
    }

    fn continue_with(&mut self, cx: &ParseContext<'_>, text: &str, caps: &regex::Captures<'_>) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let (source, note) = (group(caps, 1), group(caps, 2));
        if !source.trim().is_empty() && !note.trim().is_empty() {
            pending.push(&format!("{}{}", cx.strip(source), note));
            self.lookahead = true;
        } else {
            pending.push(text);
            self.lookahead = false;
        }
    }

    fn flush_pending(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        self.lookahead = false;
        if let Some(p) = self.pending.take() {
            let message = Message::new(BLOCK_COMPILER, p.source, p.kind, p.code, p.text, p.intro, 0);
            cx.diagnostic(&message)?;
        }
        Ok(())
    }

    /// An include chain with no diagnostic after it goes out as plain lines.
    fn flush_intro(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        for line in self.intro.drain(..) {
            cx.message(&line)?;
        }
        Ok(())
    }

    fn flush_all(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        self.flush_pending(cx)?;
        if let Some(stashed) = self.stash.take() {
            cx.message(&stashed)?;
        }
        self.flush_intro(cx)
    }
}

impl PhaseParser for CompilerParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, description: &str) -> Result<()> {
        cx.sink.open_block(BLOCK_COMPILER, description)?;
        Passthrough::enter(cx, text)
    }

    fn process_line(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        let patterns = cx.patterns;

        if let Some(stashed) = self.stash.take() {
            if patterns.caret_first.is_match(text) {
                if let Some(pending) = self.pending.as_mut() {
                    pending.push(&stashed);
                    pending.push(text);
                }
                return Ok(());
            }
            self.flush_pending(cx)?;
            cx.message(&stashed)?;
        }

        if let Some(caps) = patterns.compiler_diagnostic.captures(text) {
            self.flush_pending(cx)?;
            self.start(cx, &caps);
            return Ok(());
        }

        if self.pending.is_some() {
            if let Some(caps) = patterns.compiler_continuation.captures(text) {
                self.continue_with(cx, text, &caps);
                return Ok(());
            }
            if self.lookahead {
                self.stash = Some(text.to_string());
                self.lookahead = false;
                return Ok(());
            }
            self.flush_pending(cx)?;
        }

        if text.starts_with(INCLUDE_INTRO) {
            self.intro.push(text.to_string());
            return Ok(());
        }
        if !self.intro.is_empty() {
            // gcc continues the chain with indented "from ..." lines
            if patterns.compiler_continuation.is_match(text) {
                self.intro.push(text.to_string());
                return Ok(());
            }
            self.flush_intro(cx)?;
        }

        cx.message(text)
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        self.flush_all(cx)?;
        Passthrough::leave(cx, text)?;
        cx.sink.close_block(BLOCK_COMPILER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::testing::{Event, Harness};

    fn run(h: &mut Harness, lines: &[&str]) {
        let mut p = CompilerParser::new();
        p.on_enter(&mut h.cx(), "", "Building 3 actions with 8 processes").unwrap();
        h.feed(&mut p, lines);
        p.on_leave(&mut h.cx(), "").unwrap();
    }

    #[test]
    fn caret_line_is_folded_into_error() {
        let mut h = Harness::new();
        run(
            &mut h,
            &["Foo.cpp(10): error C2065: 'x': undeclared identifier", "        ^"],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        let m = msgs[0];
        assert_eq!(m.kind, MessageType::Error);
        assert_eq!(m.source, "Foo.cpp(10)");
        assert_eq!(m.code, "C2065");
        assert!(m.text.ends_with("        ^"));
        assert_eq!(m.block, BLOCK_COMPILER);
        assert_eq!(m.indent, 0);
    }

    #[test]
    fn echoed_source_and_caret_are_folded_together() {
        let mut h = Harness::new();
        run(
            &mut h,
            &[
                "/src/Foo.cpp:10:5: error: use of undeclared identifier 'x'",
                "    x = 1;",
                "    ^",
                "next line",
            ],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(
            msgs[0].text,
            "use of undeclared identifier 'x'\n    x = 1;\n    ^"
        );
        assert_eq!(h.sink.lines(), vec!["next line"]);
    }

    #[test]
    fn stashed_line_without_caret_is_emitted_and_next_line_reexamined() {
        let mut h = Harness::new();
        run(
            &mut h,
            &[
                "a.cpp(1): warning C4100: unused",
                "plain output",
                "b.cpp(2): error C2000: broken",
            ],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].kind, MessageType::Warning);
        assert_eq!(msgs[0].text, "unused");
        assert_eq!(msgs[1].source, "b.cpp(2)");
        assert_eq!(h.sink.lines(), vec!["plain output"]);
    }

    #[test]
    fn notes_are_appended_with_stripped_paths() {
        let mut h = Harness::with_root(r"C:\Work\");
        run(
            &mut h,
            &[
                r"C:\Work\a.cpp(1): error C2660: wrong args",
                r"C:\Work\a.h(5): note: see declaration",
                r"C:\Work\a.h(9): note: another",
            ],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].source, "a.cpp(1)");
        assert_eq!(
            msgs[0].text,
            "wrong args\na.h(5): note: see declaration\na.h(9): note: another"
        );
    }

    #[test]
    fn include_chain_becomes_intro() {
        let mut h = Harness::new();
        run(
            &mut h,
            &[
                "In file included from a.cpp:1:",
                "                 from b.h:2,",
                "c.h:3:1: fatal error: missing.h: No such file or directory",
            ],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].kind, MessageType::Error);
        assert_eq!(msgs[0].code, "missing.h");
        assert_eq!(
            msgs[0].intro,
            "In file included from a.cpp:1:\n                 from b.h:2,"
        );
    }

    #[test]
    fn orphan_include_chain_is_not_dropped() {
        let mut h = Harness::new();
        run(&mut h, &["In file included from a.cpp:1:", "something else"]);
        assert!(h.sink.messages().is_empty());
        assert_eq!(
            h.sink.lines(),
            vec!["In file included from a.cpp:1:", "something else"]
        );
    }

    #[test]
    fn pending_error_is_flushed_on_leave() {
        let mut h = Harness::new();
        run(&mut h, &["x.cpp(3): error C1: bad", "    held back"]);
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(h.sink.lines(), vec!["    held back"]);
        assert_eq!(h.sink.events.last(), Some(&Event::Close("Compiler".into())));
    }
}
