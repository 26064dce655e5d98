//! Gauntlet automated test runs.
//!
//! Tests are tracked by path. After a test completes, the controller may
//! replay its events between `BeginEvents` and `EndEvents`; those lines are
//! collected into the test's stdout/stderr.

use super::{ParseContext, Passthrough, PhaseParser};
use crate::constants::{BLOCK_EVENTS, BLOCK_GAUNTLET};
use crate::message::{Message, MessageType};
use crate::patterns::group;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestState {
    #[default]
    Idle,
    Started,
    Ended,
    Events,
}

#[derive(Debug)]
pub struct GauntletParser {
    suite_base: String,
    suite: String,
    state: TestState,
    test_path: Option<String>,
    events_out: String,
    events_err: String,
}

impl GauntletParser {
    pub fn new(test_suite_name: &str) -> Self {
        GauntletParser {
            suite_base: test_suite_name.to_string(),
            suite: test_suite_name.to_string(),
            state: TestState::Idle,
            test_path: None,
            events_out: String::new(),
            events_err: String::new(),
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn suite_name(&self) -> &str {
        &self.suite
    }

    fn is_current(&self, path: &str) -> bool {
        self.test_path.as_deref() == Some(path)
    }

    fn start_test(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<bool> {
        let Some(caps) = cx.patterns.test_started.captures(text) else {
            return Ok(false);
        };
        let path = group(&caps, 2);
        cx.sink.start_test(path)?;
        self.test_path = Some(path.to_string());
        cx.message(text)?;
        self.state = TestState::Started;
        Ok(true)
    }

    fn finish_test(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        if let Some(path) = self.test_path.take() {
            cx.sink.finish_test(&path)?;
        }
        self.events_out.clear();
        self.events_err.clear();
        self.state = TestState::Idle;
        Ok(())
    }

    fn idle(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if !self.start_test(cx, text)? {
            cx.message(text)?;
        }
        Ok(())
    }

    fn started(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        let Some(caps) = cx.patterns.test_completed.captures(text) else {
            return cx.message(text);
        };
        let (result, name, path) = (group(&caps, 1), group(&caps, 2), group(&caps, 3));
        if result == "Fail" {
            cx.sink.fail_test(path, name, text)?;
        } else {
            cx.message(text)?;
        }
        self.state = TestState::Ended;
        Ok(())
    }

    fn ended(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if let Some(caps) = cx.patterns.begin_events.captures(text) {
            if self.is_current(group(&caps, 1)) {
                cx.sink.open_block(BLOCK_EVENTS, "")?;
                cx.message(text)?;
                self.events_out.clear();
                self.events_err.clear();
                self.state = TestState::Events;
                return Ok(());
            }
        }
        // the next test started without an events replay for this one
        if cx.patterns.test_started.is_match(text) {
            self.finish_test(cx)?;
            return self.idle(cx, text);
        }
        cx.message(text)
    }

    fn events(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        let patterns = cx.patterns;
        if let Some(caps) = patterns.end_events.captures(text) {
            let path = group(&caps, 1);
            if self.is_current(path) {
                cx.message(text)?;
                self.close_events(cx, path)?;
                return self.finish_test(cx);
            }
        }

        let Some(caps) = patterns.event_diagnostic.captures(text) else {
            return cx.message(text);
        };
        let (indent, level, body) = (group(&caps, 1).len(), group(&caps, 3), group(&caps, 4));
        let (buffer, kind) = match level {
            "Err0r" => (&mut self.events_err, MessageType::Error),
            _ => (&mut self.events_out, MessageType::Warning),
        };
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(text);

        let source = self.test_path.as_deref().unwrap_or_default();
        let message = Message::new(BLOCK_GAUNTLET, source, kind, "", body, "", indent);
        cx.diagnostic(&message)
    }

    fn close_events(&mut self, cx: &mut ParseContext<'_>, path: &str) -> Result<()> {
        cx.sink.close_block(BLOCK_EVENTS)?;
        if !self.events_err.trim().is_empty() {
            cx.sink.test_stderr(path, &self.events_err)?;
        }
        if !self.events_out.trim().is_empty() {
            cx.sink.test_stdout(path, &self.events_out)?;
        }
        Ok(())
    }
}

impl PhaseParser for GauntletParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, description: &str) -> Result<()> {
        self.state = TestState::Idle;
        self.test_path = None;
        cx.sink.open_block(BLOCK_GAUNTLET, description)?;

        let configuration = cx.patterns.configuration_arg.captures(text);
        let platform = cx.patterns.platform_arg.captures(text);
        self.suite = match (platform, configuration) {
            (Some(p), Some(c)) => format!("{} ({} {})", self.suite_base, group(&p, 1), group(&c, 1)),
            _ => self.suite_base.clone(),
        };
        log::debug!("gauntlet suite: {}", self.suite);
        cx.sink.start_test_suite(&self.suite)?;
        Passthrough::enter(cx, text)
    }

    fn process_line(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        match self.state {
            TestState::Idle => self.idle(cx, text),
            TestState::Started => self.started(cx, text),
            TestState::Ended => self.ended(cx, text),
            TestState::Events => self.events(cx, text),
        }
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if self.state == TestState::Events {
            if let Some(path) = self.test_path.clone() {
                self.close_events(cx, &path)?;
            }
        }
        self.finish_test(cx)?;
        cx.sink.finish_test_suite(&self.suite)?;
        Passthrough::leave(cx, text)?;
        cx.sink.close_block(BLOCK_GAUNTLET)
    }
}
