//! The statistics report a cook prints when it finishes.
//!
//! Every line is still echoed; the parser only picks values out on the side.

use super::{ParseContext, Passthrough, PhaseParser};
use crate::constants::{
    BLOCK_COOKSTATS, HIERARCHY_COOK_PROFILE, HIERARCHY_TIMER, STAT_GROUP_DDC_SUMMARY,
    STAT_GROUP_UNKNOWN,
};
use crate::patterns::group;
use crate::stat_store::FlatStat;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatSection {
    #[default]
    None,
    Misc,
    CookProfile,
    DdcSummary,
    DdcResources,
    HierarchyTimer,
}

#[derive(Debug, Default)]
pub struct CookStatsParser {
    section: StatSection,
    group: Option<String>,
    flat: Vec<FlatStat>,
}

impl CookStatsParser {
    pub fn new() -> Self {
        CookStatsParser::default()
    }

    pub fn section(&self) -> StatSection {
        self.section
    }

    fn pick_section(&mut self, cx: &ParseContext<'_>, text: &str) {
        let p = cx.patterns;
        self.section = if p.cook_profile_start.is_match(text) {
            StatSection::CookProfile
        } else if p.misc_stats_start.is_match(text) {
            StatSection::Misc
        } else if p.ddc_summary_start.is_match(text) {
            StatSection::DdcSummary
        } else if p.ddc_resources_start.is_match(text) {
            StatSection::DdcResources
        } else if p.hierarchy_timer_start.is_match(text) {
            StatSection::HierarchyTimer
        } else {
            StatSection::None
        };
        match self.section {
            StatSection::DdcSummary => self.group = Some(STAT_GROUP_DDC_SUMMARY.to_string()),
            StatSection::CookProfile | StatSection::HierarchyTimer => self.flat.clear(),
            _ => {}
        }
        if self.section != StatSection::None {
            log::debug!("cook stats section: {:?}", self.section);
        }
    }

    /// `key = value` lines, filed under the current group.
    fn simple_stat(&mut self, cx: &mut ParseContext<'_>, text: &str) -> bool {
        let Some(caps) = cx.patterns.simple_stat.captures(text) else {
            return false;
        };
        let group_name = self.group.as_deref().unwrap_or(STAT_GROUP_UNKNOWN);
        if let Some(stats) = cx.stats() {
            stats.add_stat(group_name, group(&caps, 1), group(&caps, 2));
        }
        true
    }

    /// Any other text line names the group that follows, unless it is a rule.
    fn group_name(&mut self, cx: &ParseContext<'_>, text: &str) -> bool {
        let Some(caps) = cx.patterns.stat_text.captures(text) else {
            return false;
        };
        let name = group(&caps, 1);
        if !name.starts_with("==") {
            self.group = Some(name.to_string());
        }
        true
    }

    fn profile_stat(&mut self, cx: &ParseContext<'_>, text: &str) -> bool {
        let Some(caps) = cx.patterns.profile_stat.captures(text) else {
            return false;
        };
        // three characters per nesting level, counted from one
        let level = (group(&caps, 1).len() / 3).saturating_sub(1);
        self.flat
            .push(FlatStat::new(group(&caps, 2), group(&caps, 3), level, 0));
        true
    }

    fn timer_stat(&mut self, cx: &ParseContext<'_>, text: &str) -> bool {
        let Some(caps) = cx.patterns.timer_stat.captures(text) else {
            return false;
        };
        // two columns per nesting level after a two column margin
        let level = group(&caps, 1).len().saturating_sub(2) >> 1;
        let count = group(&caps, 4).parse().unwrap_or(0);
        self.flat
            .push(FlatStat::new(group(&caps, 2), group(&caps, 3), level, count));
        true
    }

    fn end_hierarchy(&mut self, cx: &mut ParseContext<'_>, hierarchy: &str) {
        if let Some(stats) = cx.stats() {
            stats.add_hierarchy(hierarchy, &self.flat);
        }
        self.flat.clear();
        self.section = StatSection::None;
    }
}

impl PhaseParser for CookStatsParser {
    fn on_enter(&mut self, cx: &mut ParseContext<'_>, text: &str, description: &str) -> Result<()> {
        self.section = StatSection::None;
        self.group = None;
        self.flat.clear();
        cx.sink.open_block(BLOCK_COOKSTATS, description)?;
        Passthrough::enter(cx, text)?;
        if !text.trim().is_empty() {
            self.pick_section(cx, text);
        }
        Ok(())
    }

    fn process_line(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        match self.section {
            StatSection::Misc | StatSection::DdcSummary => {
                if !self.simple_stat(cx, text) && !self.group_name(cx, text) {
                    self.group = None;
                    self.section = StatSection::None;
                }
            }
            StatSection::CookProfile => {
                if !self.profile_stat(cx, text) && !text.ends_with("==") {
                    self.end_hierarchy(cx, HIERARCHY_COOK_PROFILE);
                }
            }
            StatSection::HierarchyTimer => {
                if !self.timer_stat(cx, text) {
                    self.end_hierarchy(cx, HIERARCHY_TIMER);
                }
            }
            StatSection::None | StatSection::DdcResources => self.pick_section(cx, text),
        }
        cx.message(text)
    }

    fn on_leave(&mut self, cx: &mut ParseContext<'_>, text: &str) -> Result<()> {
        // a report cut off mid-section still gets its tree
        match self.section {
            StatSection::CookProfile if !self.flat.is_empty() => {
                self.end_hierarchy(cx, HIERARCHY_COOK_PROFILE)
            }
            StatSection::HierarchyTimer if !self.flat.is_empty() => {
                self.end_hierarchy(cx, HIERARCHY_TIMER)
            }
            _ => {}
        }
        self.section = StatSection::None;
        self.group = None;
        Passthrough::leave(cx, text)?;
        cx.sink.close_block(BLOCK_COOKSTATS)
    }
}
