//! Deduplicating store for warnings and errors.
//!
//! Messages are keyed by [`Message::fingerprint`]. Adding a message that is
//! already present bumps its `occurrences` instead of storing a second copy.

use crate::constants::BLOCK_VALIDATEASSET;
use crate::message::{Message, MessageType};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Which blocks a store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockFilter {
    All,
    Only(String),
    Exclude(Vec<String>),
}

impl BlockFilter {
    /// The filter used for the asset validation report.
    pub fn asset_validation() -> Self {
        BlockFilter::Only(BLOCK_VALIDATEASSET.to_string())
    }

    pub fn accepts(&self, block: &str) -> bool {
        match self {
            BlockFilter::All => true,
            BlockFilter::Only(name) => name == block,
            BlockFilter::Exclude(names) => !names.iter().any(|n| n == block),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    New,
    Duplicate,
    Rejected,
}

/// Error/warning counts for one block (or for the whole store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub name: String,
    pub num_errors: u32,
    pub num_errors_unique: u32,
    pub num_warnings: u32,
    pub num_warnings_unique: u32,
}

impl LogSummary {
    /// Per-block summaries of every store that has messages, in store order.
    pub fn combined(stores: &[&MessageStore]) -> Vec<LogSummary> {
        stores
            .iter()
            .filter(|s| s.has_messages())
            .flat_map(|s| s.summaries())
            .collect()
    }
}

/// Counts of asset validation probes seen during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationTally {
    pub probes: u32,
    pub failures: u32,
}

/// Overall outcome of a run, derived once the process has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    pub text: String,
}

impl RunStatus {
    pub fn status(&self) -> &'static str {
        if self.success {
            "SUCCESS"
        } else {
            "FAILURE"
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageStore {
    filter: BlockFilter,
    index: HashMap<String, usize>,
    messages: Vec<Message>,
    validation: ValidationTally,
    run_status: Option<RunStatus>,
}

impl Default for MessageStore {
    fn default() -> Self {
        MessageStore::new(BlockFilter::All)
    }
}

/// A store shared between a sink and whoever reads the results afterwards.
pub type SharedMessageStore = Rc<RefCell<MessageStore>>;

pub fn shared_store(filter: BlockFilter) -> SharedMessageStore {
    Rc::new(RefCell::new(MessageStore::new(filter)))
}

impl MessageStore {
    pub fn new(filter: BlockFilter) -> Self {
        MessageStore {
            filter,
            index: HashMap::new(),
            messages: Vec::new(),
            validation: ValidationTally::default(),
            run_status: None,
        }
    }

    pub fn filter(&self) -> &BlockFilter {
        &self.filter
    }

    pub fn add_message(&mut self, message: &Message) -> AddOutcome {
        if !self.filter.accepts(&message.block) {
            return AddOutcome::Rejected;
        }
        let fingerprint = message.fingerprint();
        if let Some(&pos) = self.index.get(&fingerprint) {
            let existing = &mut self.messages[pos];
            existing.occurrences += 1;
            log::trace!(
                "duplicate message {} ({} occurrences)",
                &fingerprint[..12],
                existing.occurrences
            );
            return AddOutcome::Duplicate;
        }
        let mut stored = message.clone();
        stored.occurrences = 1;
        self.index.insert(fingerprint, self.messages.len());
        self.messages.push(stored);
        AddOutcome::New
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Stored messages, in the order they were first seen.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Message> {
        self.index.get(fingerprint).map(|&pos| &self.messages[pos])
    }

    /// Fingerprint to occurrence count, for comparing two runs.
    pub fn occurrence_map(&self) -> HashMap<String, u32> {
        self.index
            .iter()
            .map(|(fp, &pos)| (fp.clone(), self.messages[pos].occurrences))
            .collect()
    }

    /// Distinct block names, first-seen order.
    pub fn blocks(&self) -> Vec<String> {
        let mut blocks: Vec<String> = Vec::new();
        for message in &self.messages {
            if !blocks.contains(&message.block) {
                blocks.push(message.block.clone());
            }
        }
        blocks
    }

    /// Counts for one block, or for the whole store when `block` is `None` or empty.
    pub fn summary(&self, block: Option<&str>) -> LogSummary {
        let block = block.filter(|b| !b.is_empty());
        let mut summary = LogSummary {
            name: block.unwrap_or("Summary").to_string(),
            num_errors: 0,
            num_errors_unique: 0,
            num_warnings: 0,
            num_warnings_unique: 0,
        };
        for message in self
            .messages
            .iter()
            .filter(|m| block.is_none_or(|b| m.block == b))
        {
            match message.kind {
                MessageType::Error => {
                    summary.num_errors_unique += 1;
                    summary.num_errors += message.occurrences;
                }
                MessageType::Warning => {
                    summary.num_warnings_unique += 1;
                    summary.num_warnings += message.occurrences;
                }
            }
        }
        summary
    }

    pub fn summaries(&self) -> Vec<LogSummary> {
        self.blocks()
            .iter()
            .map(|b| self.summary(Some(b)))
            .collect()
    }

    pub fn validation(&self) -> ValidationTally {
        self.validation
    }

    pub fn record_probe(&mut self) {
        self.validation.probes += 1;
    }

    pub fn record_validation_failure(&mut self) {
        self.validation.failures += 1;
    }

    pub fn run_status(&self) -> Option<&RunStatus> {
        self.run_status.as_ref()
    }

    /// Works out the final status line from the exit code, the stored counts
    /// and the asset validation tally, and remembers it.
    pub fn conclude(&mut self, exit_code: i32) -> RunStatus {
        let summary = self.summary(None);
        let fails = self.validation.failures;
        let probes = self.validation.probes;
        let success = exit_code == 0 && fails == 0;
        // validation failures are also stored as errors; don't count them twice
        let errors = summary.num_errors.saturating_sub(fails);
        let warnings = summary.num_warnings;

        let text = if success && warnings == 0 && summary.num_errors == 0 {
            String::new()
        } else {
            let mut parts: Vec<String> = Vec::new();
            if probes > 0 {
                if fails == 0 {
                    parts.push(format!("{} tests passed", probes));
                } else {
                    parts.push(format!("{} of {} tests failed", fails, probes));
                }
            }
            if errors > 0 {
                parts.push(format!("{} errors", errors));
            }
            if warnings > 0 {
                parts.push(format!("{} warnings", warnings));
            }
            format!("({})", parts.join(", "))
        };
        let status = RunStatus { success, text };
        log::debug!("run concluded: {} {}", status.status(), status.text);
        self.run_status = Some(status.clone());
        status
    }

    /// Drops everything, ready for a new run.
    pub fn clear(&mut self) {
        self.index.clear();
        self.messages.clear();
        self.validation = ValidationTally::default();
        self.run_status = None;
    }
}
