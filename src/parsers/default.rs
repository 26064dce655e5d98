use super::{ParseContext, Passthrough, PhaseParser};
use anyhow::Result;

/// Lines outside any recognised phase.
#[derive(Debug, Default)]
pub struct DefaultParser;

impl PhaseParser for DefaultParser {}

/// Plain passthrough wrapped in a named block. Used for the build tool run
/// and for generic tasks.
#[derive(Debug)]
pub struct BlockParser {
    block: &'static str,
}

impl BlockParser {
    pub fn new(block: &'static str) -> Self {
        BlockParser { block }
    }

    pub fn block(&self) -> &'static str {
        self.block
    }
}

impl PhaseParser for BlockParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, description: &str) -> Result<()> {
        cx.sink.open_block(self.block, description)?;
        Passthrough::enter(cx, text)
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        Passthrough::leave(cx, text)?;
        cx.sink.close_block(self.block)
    }
}
