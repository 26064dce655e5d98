use crate::listener::LogListener;
use anyhow::{Context, Result};
use std::io::BufRead;

/// Pulls lines from a reader into a listener until end of stream.
///
/// The listener is always given its final flush, even when reading fails
/// part way; the read error is returned afterwards.
#[derive(Debug, Default)]
pub struct LineFeeder {
    lines_read: usize,
}

impl LineFeeder {
    pub fn new() -> Self {
        LineFeeder::default()
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn run<R: BufRead>(&mut self, reader: R, listener: &mut LogListener) -> Result<usize> {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    listener.finish()?;
                    return Err(err)
                        .with_context(|| format!("failed to read log line {}", self.lines_read + 1));
                }
            };
            self.lines_read += 1;
            let text = line.strip_suffix('\r').unwrap_or(&line);
            listener
                .on_line(text)
                .with_context(|| format!("while handling log line {}", self.lines_read))?;
        }
        listener.finish()?;
        log::info!("processed {} lines", self.lines_read);
        Ok(self.lines_read)
    }
}
