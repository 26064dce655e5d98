//! JSON artifacts written at the end of a run.

use crate::constants::{
    ARTIFACTS_ASSETS_JSON, ARTIFACTS_REPORT_JSON, ARTIFACTS_SUMMARY_FILE, ARTIFACTS_STATS_JSON,
    ARTIFACTS_HIERARCHICAL_STATS_JSON, ARTIFACTS_SEQUENCE_STATS_JSON,
};
use crate::message::Message;
use crate::message_store::{LogSummary, MessageStore};
use crate::stat_store::StatStore;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", name))?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Writes the report files into `dir`, creating it if needed.
///
/// A file is only written when it would have content. Returns the paths
/// that were written, in a fixed order.
pub fn write_artifacts(
    dir: &Path,
    build: &MessageStore,
    assets: &MessageStore,
    stats: Option<&StatStore>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let mut written = Vec::new();

    if build.has_messages() {
        let messages: Vec<&Message> = build.messages().collect();
        written.push(write_json(dir, ARTIFACTS_REPORT_JSON, &messages)?);
    }
    if assets.has_messages() {
        let messages: Vec<&Message> = assets.messages().collect();
        written.push(write_json(dir, ARTIFACTS_ASSETS_JSON, &messages)?);
    }
    // the asset store only stands in when the main store saw nothing
    let summary_source = if build.has_messages() { build } else { assets };
    let summaries = LogSummary::combined(&[summary_source]);
    if !summaries.is_empty() {
        written.push(write_json(dir, ARTIFACTS_SUMMARY_FILE, &summaries)?);
    }

    if let Some(stats) = stats {
        if !stats.groups().is_empty() {
            written.push(write_json(dir, ARTIFACTS_STATS_JSON, stats.groups())?);
        }
        if !stats.sequenced().is_empty() {
            written.push(write_json(dir, ARTIFACTS_SEQUENCE_STATS_JSON, stats.sequenced())?);
        }
        if !stats.hierarchies().is_empty() {
            written.push(write_json(dir, ARTIFACTS_HIERARCHICAL_STATS_JSON, stats.hierarchies())?);
        }
    }
    Ok(written)
}
