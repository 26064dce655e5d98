use crate::message_store::{LogSummary, MessageStore};
use crate::stat_store::StatStore;
use comfy_table::{Cell, ContentArrangement, Row, Table};

const TOP_MESSAGES: usize = 10;

fn table(width: u16) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(width);
    table
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Human readable summary of a run: status, per-block counts, the most
/// repeated messages and how many stats were collected.
pub fn generate_comfy_report(
    stores: &[(&str, &MessageStore)],
    stats: Option<&StatStore>,
) -> String {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let mut metadata = table(80);
    metadata.add_row(Row::from(vec![
        Cell::new("Build Log Report"),
        Cell::new(format!("ue-buildlog {}", env!("CARGO_PKG_VERSION"))),
    ]));
    metadata.add_row(Row::from(vec![Cell::new("generated on"), Cell::new(generated)]));
    for (name, store) in stores {
        if let Some(status) = store.run_status() {
            metadata.add_row(Row::from(vec![
                Cell::new(format!("{} status", name)),
                Cell::new(format!("{} {}", status.status(), status.text)),
            ]));
        }
    }
    let mut report = metadata.to_string();
    report.push_str("\n\n");

    // per-block counts come from the first store that has anything
    let summaries = stores
        .iter()
        .find(|(_, s)| s.has_messages())
        .map(|(_, s)| LogSummary::combined(&[*s]))
        .unwrap_or_default();
    if !summaries.is_empty() {
        let mut blocks = table(100);
        blocks.add_row(Row::from(vec![
            Cell::new("Block"),
            Cell::new("Errors"),
            Cell::new("Unique"),
            Cell::new("Warnings"),
            Cell::new("Unique"),
        ]));
        for s in &summaries {
            blocks.add_row(Row::from(vec![
                Cell::new(&s.name),
                Cell::new(s.num_errors),
                Cell::new(s.num_errors_unique),
                Cell::new(s.num_warnings),
                Cell::new(s.num_warnings_unique),
            ]));
        }
        report.push_str(&blocks.to_string());
        report.push_str("\n\n");
    }

    for (name, store) in stores {
        if !store.has_messages() {
            continue;
        }
        let mut top: Vec<_> = store.messages().collect();
        top.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        top.truncate(TOP_MESSAGES);

        report.push_str(&format!("## {}\n\n", name));
        let mut messages = table(100);
        messages.add_row(Row::from(vec![
            Cell::new("Count"),
            Cell::new("Type"),
            Cell::new("Source"),
            Cell::new("Message"),
        ]));
        for m in top {
            messages.add_row(Row::from(vec![
                Cell::new(m.occurrences),
                Cell::new(m.kind),
                Cell::new(&m.source),
                Cell::new(first_line(&m.text)),
            ]));
        }
        report.push_str(&messages.to_string());
        report.push_str("\n\n");
    }

    if let Some(stats) = stats.filter(|s| s.has_stats()) {
        let mut stat_table = table(80);
        stat_table.add_row(Row::from(vec![Cell::new("Stats"), Cell::new("Entries")]));
        for (group, values) in stats.groups() {
            stat_table.add_row(Row::from(vec![Cell::new(group), Cell::new(values.len())]));
        }
        for (name, samples) in stats.sequenced() {
            stat_table.add_row(Row::from(vec![
                Cell::new(format!("{} (sequence)", name)),
                Cell::new(samples.len()),
            ]));
        }
        for (name, tree) in stats.hierarchies() {
            stat_table.add_row(Row::from(vec![
                Cell::new(format!("{} (hierarchy)", name)),
                Cell::new(tree.len()),
            ]));
        }
        report.push_str(&stat_table.to_string());
        report.push('\n');
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, MessageType};

    #[test]
    fn report_lists_blocks_and_top_messages() {
        let mut store = MessageStore::default();
        let m = Message::new("Compiler", "a.cpp(1)", MessageType::Error, "C1", "bad\nmore", "", 0);
        store.add_message(&m);
        store.add_message(&m);
        store.conclude(1);
        let mut stats = StatStore::new();
        stats.add_stat("Tool Durations", "UBT", "3.5");

        let report = generate_comfy_report(&[("build", &store)], Some(&stats));
        assert!(report.contains("Compiler"));
        assert!(report.contains("a.cpp(1)"));
        assert!(report.contains("FAILURE"));
        assert!(report.contains("Tool Durations"));
        assert!(!report.contains("more"));
    }

    #[test]
    fn empty_run_still_has_header() {
        let store = MessageStore::default();
        let report = generate_comfy_report(&[("build", &store)], None);
        assert!(report.contains("Build Log Report"));
        assert!(!report.contains("## build"));
    }
}
