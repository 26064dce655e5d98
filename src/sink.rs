//! Where parsed events go.
//!
//! The engine never writes anywhere itself; every plain line, diagnostic,
//! stat and test event is handed to a [`LogSink`]. Sinks can be stacked with
//! [`SinkFanout`].

use crate::message::Message;
use crate::message_store::SharedMessageStore;
use anyhow::{Context, Result};
use std::io::Write;

/// Receiver for everything the listener and its parsers emit.
///
/// Every method has a no-op default so a sink only implements what it cares
/// about.
#[allow(unused_variables)]
pub trait LogSink {
    fn process_started(&mut self, cmdline: &str) -> Result<()> {
        Ok(())
    }
    fn process_finished(&mut self, exit_code: i32) -> Result<()> {
        Ok(())
    }

    fn open_block(&mut self, name: &str, description: &str) -> Result<()> {
        Ok(())
    }
    fn close_block(&mut self, name: &str) -> Result<()> {
        Ok(())
    }

    /// A plain output line.
    fn message(&mut self, text: &str) -> Result<()> {
        Ok(())
    }
    fn warning(&mut self, message: &Message) -> Result<()> {
        Ok(())
    }
    fn error(&mut self, message: &Message) -> Result<()> {
        Ok(())
    }

    fn start_progress(&mut self, name: &str) -> Result<()> {
        Ok(())
    }
    fn progress(&mut self, text: &str) -> Result<()> {
        Ok(())
    }
    fn finish_progress(&mut self, name: &str) -> Result<()> {
        Ok(())
    }

    fn status(&mut self, status: &str, additional: &str) -> Result<()> {
        Ok(())
    }
    fn stat(&mut self, key: &str, value: &str) -> Result<()> {
        Ok(())
    }

    fn start_test_suite(&mut self, name: &str) -> Result<()> {
        Ok(())
    }
    fn finish_test_suite(&mut self, name: &str) -> Result<()> {
        Ok(())
    }
    fn start_test(&mut self, name: &str) -> Result<()> {
        Ok(())
    }
    fn finish_test(&mut self, name: &str) -> Result<()> {
        Ok(())
    }
    fn test_stdout(&mut self, name: &str, out: &str) -> Result<()> {
        Ok(())
    }
    fn test_stderr(&mut self, name: &str, out: &str) -> Result<()> {
        Ok(())
    }
    fn fail_test(&mut self, name: &str, message: &str, details: &str) -> Result<()> {
        Ok(())
    }
    fn ignore_test(&mut self, name: &str, message: &str) -> Result<()> {
        Ok(())
    }

    /// An asset validation probe line ("Validating ...").
    fn validate_asset(&mut self, line: &str) -> Result<()> {
        Ok(())
    }
    fn validate_fail(&mut self, message: &Message) -> Result<()> {
        Ok(())
    }
}

/// Delivers each event to every inner sink, in insertion order.
#[derive(Default)]
pub struct SinkFanout {
    sinks: Vec<Box<dyn LogSink>>,
}

impl SinkFanout {
    pub fn new() -> Self {
        SinkFanout::default()
    }

    pub fn with(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn LogSink) -> Result<()>) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            f(sink.as_mut())?;
        }
        Ok(())
    }
}

impl LogSink for SinkFanout {
    fn process_started(&mut self, cmdline: &str) -> Result<()> {
        self.each(|s| s.process_started(cmdline))
    }
    fn process_finished(&mut self, exit_code: i32) -> Result<()> {
        self.each(|s| s.process_finished(exit_code))
    }
    fn open_block(&mut self, name: &str, description: &str) -> Result<()> {
        self.each(|s| s.open_block(name, description))
    }
    fn close_block(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.close_block(name))
    }
    fn message(&mut self, text: &str) -> Result<()> {
        self.each(|s| s.message(text))
    }
    fn warning(&mut self, message: &Message) -> Result<()> {
        self.each(|s| s.warning(message))
    }
    fn error(&mut self, message: &Message) -> Result<()> {
        self.each(|s| s.error(message))
    }
    fn start_progress(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.start_progress(name))
    }
    fn progress(&mut self, text: &str) -> Result<()> {
        self.each(|s| s.progress(text))
    }
    fn finish_progress(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.finish_progress(name))
    }
    fn status(&mut self, status: &str, additional: &str) -> Result<()> {
        self.each(|s| s.status(status, additional))
    }
    fn stat(&mut self, key: &str, value: &str) -> Result<()> {
        self.each(|s| s.stat(key, value))
    }
    fn start_test_suite(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.start_test_suite(name))
    }
    fn finish_test_suite(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.finish_test_suite(name))
    }
    fn start_test(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.start_test(name))
    }
    fn finish_test(&mut self, name: &str) -> Result<()> {
        self.each(|s| s.finish_test(name))
    }
    fn test_stdout(&mut self, name: &str, out: &str) -> Result<()> {
        self.each(|s| s.test_stdout(name, out))
    }
    fn test_stderr(&mut self, name: &str, out: &str) -> Result<()> {
        self.each(|s| s.test_stderr(name, out))
    }
    fn fail_test(&mut self, name: &str, message: &str, details: &str) -> Result<()> {
        self.each(|s| s.fail_test(name, message, details))
    }
    fn ignore_test(&mut self, name: &str, message: &str) -> Result<()> {
        self.each(|s| s.ignore_test(name, message))
    }
    fn validate_asset(&mut self, line: &str) -> Result<()> {
        self.each(|s| s.validate_asset(line))
    }
    fn validate_fail(&mut self, message: &Message) -> Result<()> {
        self.each(|s| s.validate_fail(message))
    }
}

/// Writes the readable part of the stream to any writer.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        TextSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text).context("failed to write log output")
    }
}

impl<W: Write> LogSink for TextSink<W> {
    fn message(&mut self, text: &str) -> Result<()> {
        self.line(text)
    }
    fn warning(&mut self, message: &Message) -> Result<()> {
        self.line(&message.to_string())
    }
    fn error(&mut self, message: &Message) -> Result<()> {
        self.line(&message.to_string())
    }
    fn progress(&mut self, text: &str) -> Result<()> {
        self.line(text)
    }
    fn validate_asset(&mut self, line: &str) -> Result<()> {
        self.line(line)
    }
    fn validate_fail(&mut self, message: &Message) -> Result<()> {
        self.line(&message.to_string())
    }
    fn process_finished(&mut self, _exit_code: i32) -> Result<()> {
        self.out.flush().context("failed to flush log output")
    }
}

/// Feeds warnings and errors into a shared [`MessageStore`](crate::message_store::MessageStore).
#[derive(Clone)]
pub struct StoreSink {
    store: SharedMessageStore,
}

impl StoreSink {
    pub fn new(store: SharedMessageStore) -> Self {
        StoreSink { store }
    }

    pub fn store(&self) -> &SharedMessageStore {
        &self.store
    }
}

impl LogSink for StoreSink {
    fn warning(&mut self, message: &Message) -> Result<()> {
        self.store.borrow_mut().add_message(message);
        Ok(())
    }
    fn error(&mut self, message: &Message) -> Result<()> {
        self.store.borrow_mut().add_message(message);
        Ok(())
    }
    fn validate_asset(&mut self, _line: &str) -> Result<()> {
        self.store.borrow_mut().record_probe();
        Ok(())
    }
    fn validate_fail(&mut self, message: &Message) -> Result<()> {
        let mut store = self.store.borrow_mut();
        store.record_validation_failure();
        store.add_message(message);
        Ok(())
    }
    fn process_finished(&mut self, exit_code: i32) -> Result<()> {
        self.store.borrow_mut().conclude(exit_code);
        Ok(())
    }
}
