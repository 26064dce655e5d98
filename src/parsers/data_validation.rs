//! The DataValidation commandlet.
//!
//! Every message here belongs to the asset validation block. `AssetCheck`
//! failures are reported straight away as validation failures, and
//! `Validating <asset>` lines are counted as probes.

use super::content::{ContentAccumulator, DiagnosticLine};
use super::{ParseContext, Passthrough, PhaseParser};
use crate::constants::BLOCK_VALIDATEASSET;
use crate::message::{Message, MessageType};
use crate::patterns::group;
use anyhow::Result;

const ASSET_CHECK_SOURCE: &str = "AssetCheck";

#[derive(Debug, Default)]
pub struct DataValidationParser {
    content: ContentAccumulator,
}

impl DataValidationParser {
    pub fn new() -> Self {
        DataValidationParser::default()
    }

    fn asset_check_failure(cx: &mut ParseContext<'_>, asset: &str, failure: &str) -> Result<()> {
        let (text, test_name) = match cx.patterns.asset_check_test.captures(failure) {
            Some(caps) => (group(&caps, 1), group(&caps, 2)),
            None => (failure, ""),
        };
        let message = Message::new(
            BLOCK_VALIDATEASSET,
            cx.strip(asset),
            MessageType::Error,
            test_name,
            text,
            "",
            0,
        );
        log::trace!("asset check failed: {}", message);
        cx.sink.validate_fail(&message)
    }
}

impl PhaseParser for DataValidationParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, description: &str) -> Result<()> {
        cx.sink.open_block(BLOCK_VALIDATEASSET, description)?;
        cx.sink.start_progress(text)?;
        Passthrough::enter(cx, text)
    }

    fn process_line(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        if self.content.absorb(cx, text)? {
            return Ok(());
        }

        if cx.patterns.asset_validating.is_match(text) {
            return cx.sink.validate_asset(text);
        }

        let Some(line) = DiagnosticLine::parse(cx, text) else {
            return cx.message(text);
        };
        let asset_log = line.asset_log(cx);
        match asset_log {
            Some((asset, failure)) if line.source == ASSET_CHECK_SOURCE => {
                Self::asset_check_failure(cx, asset, failure)
            }
            _ => {
                let callstack = cx.patterns.callstack_start.is_match(line.text);
                let (source, body) = match asset_log {
                    Some((asset, rest)) => (cx.strip(asset), rest),
                    None => (line.source, line.text),
                };
                self.content
                    .start(BLOCK_VALIDATEASSET, &line, source, body, callstack);
                Ok(())
            }
        }
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        self.content.flush(cx)?;
        cx.sink.finish_progress(text)?;
        Passthrough::leave(cx, text)?;
        cx.sink.close_block(BLOCK_VALIDATEASSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::testing::{Event, Harness};

    #[test]
    fn validating_lines_are_probes() {
        let mut h = Harness::new();
        let mut p = DataValidationParser::new();
        let line = "LogContentValidation: Display: Validating /Game/Maps/Arena.Arena ...";
        h.feed(&mut p, &[line]);
        assert_eq!(h.sink.events, vec![Event::Validate(line.into())]);
    }

    #[test]
    fn asset_check_is_split_into_text_and_test_name() {
        let mut h = Harness::with_root("/proj/");
        let mut p = DataValidationParser::new();
        h.feed(
            &mut p,
            &["AssetCheck: Error: [AssetLog] /proj/Content/Hero.uasset: Texture too large (TextureSizeCheck)"],
        );
        match &h.sink.events[..] {
            [Event::ValidateFail(m)] => {
                assert_eq!(m.block, BLOCK_VALIDATEASSET);
                assert_eq!(m.source, "Content/Hero");
                assert_eq!(m.code, "TextureSizeCheck");
                assert_eq!(m.text, "Texture too large");
                assert_eq!(m.kind, MessageType::Error);
                assert_eq!(m.indent, 0);
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn asset_check_without_test_name_keeps_whole_text() {
        let mut h = Harness::new();
        let mut p = DataValidationParser::new();
        h.feed(
            &mut p,
            &["AssetCheck: Warning: [AssetLog] /Game/A.umap: something odd"],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].code, "");
        assert_eq!(msgs[0].text, "something odd");
    }

    #[test]
    fn other_diagnostics_are_buffered_in_validation_block() {
        let mut h = Harness::new();
        let mut p = DataValidationParser::new();
        h.feed(
            &mut p,
            &[
                "LogDataValidation: Warning: /Game/B has issues",
                "  more detail",
                "LogTemp: Display: after",
            ],
        );
        let msgs = h.sink.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].block, BLOCK_VALIDATEASSET);
        assert_eq!(msgs[0].text, "/Game/B has issues\n  more detail");
        assert_eq!(h.sink.lines(), vec!["LogTemp: Display: after"]);
    }
}
