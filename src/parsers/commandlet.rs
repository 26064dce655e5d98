//! Editor commandlets and automation tool runs (cooking, packaging, ...).

use super::content::{ContentAccumulator, DiagnosticLine};
use super::{ParseContext, Passthrough, PhaseParser};
use crate::constants::{
    BLOCK_CONTENT, BLOCK_VALIDATEASSET, STAT_COOKER_COOKED, STAT_COOKER_REMAIN, STAT_COOKER_TOTAL,
};
use crate::patterns::group;
use anyhow::Result;

#[derive(Debug, Default)]
pub struct CommandletParser {
    content: ContentAccumulator,
    update_progress: bool,
}

impl CommandletParser {
    /// With `update_progress`, cook progress lines are reported as progress
    /// instead of being echoed.
    pub fn new(update_progress: bool) -> Self {
        CommandletParser {
            content: ContentAccumulator::default(),
            update_progress,
        }
    }

    /// Returns true when the line was consumed.
    fn process_stats(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<bool> {
        let patterns = cx.patterns;

        if let Some(caps) = patterns.cook_progress.captures(text) {
            let (done, remain, total) = (group(&caps, 1), group(&caps, 2), group(&caps, 3));
            let now = chrono::Utc::now().timestamp_millis();
            if let Some(stats) = cx.stats() {
                stats.add_sequenced_stat(STAT_COOKER_COOKED, now, done);
                stats.add_sequenced_stat(STAT_COOKER_REMAIN, now, remain);
                stats.add_sequenced_stat(STAT_COOKER_TOTAL, now, total);
            }
            if self.update_progress {
                cx.sink.progress(&format!(
                    "Cooked: {} Remaining: {} (Total: {})",
                    done, remain, total
                ))?;
                return Ok(true);
            }
            return Ok(false);
        }

        if let Some(caps) = patterns.cook_diagnostics.captures(text) {
            let now = chrono::Utc::now().timestamp_millis();
            if let Some(stats) = cx.stats() {
                for stat in patterns.cook_diagnostic_stat.captures_iter(group(&caps, 1)) {
                    stats.add_sequenced_stat(group(&stat, 1), now, group(&stat, 2));
                }
            }
        }
        Ok(false)
    }
}

impl PhaseParser for CommandletParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, description: &str) -> Result<()> {
        cx.sink.open_block(BLOCK_CONTENT, description)?;
        cx.sink.start_progress(text)?;
        Passthrough::enter(cx, text)
    }

    fn process_line(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if self.content.absorb(cx, text)? {
            return Ok(());
        }

        if let Some(line) = DiagnosticLine::parse(cx, text) {
            let callstack = cx.patterns.callstack_start.is_match(line.text);
            match line.asset_log(cx) {
                Some((asset, rest)) => {
                    let source = cx.strip(asset);
                    self.content
                        .start(BLOCK_VALIDATEASSET, &line, source, rest, callstack);
                }
                None => {
                    self.content
                        .start(BLOCK_CONTENT, &line, line.source, line.text, callstack);
                }
            }
            return Ok(());
        }

        if (cx.has_stats() || self.update_progress) && self.process_stats(cx, text)? {
            return Ok(());
        }
        cx.message(text)
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        self.content.flush(cx)?;
        cx.sink.finish_progress(text)?;
        Passthrough::leave(cx, text)?;
        cx.sink.close_block(BLOCK_CONTENT)
    }
}
