//! Aggregated statistics: flat key/value groups, time-sequenced samples and
//! hierarchical trees rebuilt from indentation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// key -> value within one group; last write wins.
pub type StatGroup = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedStatEntry {
    pub time: i64,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalStat {
    pub name: String,
    pub value: String,
    pub count: u32,
    pub level: usize,
    pub id: usize,
    pub parent_id: usize,
}

/// One indented stat line, before the tree is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatStat {
    pub name: String,
    pub value: String,
    pub level: usize,
    pub count: u32,
}

impl FlatStat {
    pub fn new(name: impl Into<String>, value: impl Into<String>, level: usize, count: u32) -> Self {
        FlatStat {
            name: name.into(),
            value: value.into(),
            level,
            count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatStore {
    groups: BTreeMap<String, StatGroup>,
    sequenced: BTreeMap<String, Vec<SequencedStatEntry>>,
    hierarchies: BTreeMap<String, Vec<HierarchicalStat>>,
}

impl StatStore {
    pub fn new() -> Self {
        StatStore::default()
    }

    pub fn add_stat(&mut self, group: &str, name: &str, value: &str) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    pub fn add_sequenced_stat(&mut self, name: &str, time: i64, value: &str) {
        self.sequenced
            .entry(name.to_string())
            .or_default()
            .push(SequencedStatEntry {
                time,
                value: value.to_string(),
            });
    }

    pub fn add_hierarchical_stat(&mut self, hierarchy: &str, stat: HierarchicalStat) {
        self.hierarchies
            .entry(hierarchy.to_string())
            .or_default()
            .push(stat);
    }

    /// Rebuilds the tree for `flat` and appends it to `hierarchy`.
    pub fn add_hierarchy(&mut self, hierarchy: &str, flat: &[FlatStat]) {
        let rebuilt = rebuild_hierarchy(flat);
        log::debug!("{}: {} hierarchical stats", hierarchy, rebuilt.len());
        for stat in rebuilt {
            self.add_hierarchical_stat(hierarchy, stat);
        }
    }

    pub fn has_stats(&self) -> bool {
        !self.groups.is_empty() || !self.sequenced.is_empty() || !self.hierarchies.is_empty()
    }

    pub fn groups(&self) -> &BTreeMap<String, StatGroup> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&StatGroup> {
        self.groups.get(name)
    }

    pub fn sequenced(&self) -> &BTreeMap<String, Vec<SequencedStatEntry>> {
        &self.sequenced
    }

    pub fn sequence(&self, name: &str) -> Option<&[SequencedStatEntry]> {
        self.sequenced.get(name).map(Vec::as_slice)
    }

    pub fn hierarchies(&self) -> &BTreeMap<String, Vec<HierarchicalStat>> {
        &self.hierarchies
    }

    pub fn hierarchy(&self, name: &str) -> Option<&[HierarchicalStat]> {
        self.hierarchies.get(name).map(Vec::as_slice)
    }
}

/// Turns an indent-tagged list into parent-linked entries.
///
/// Ids are the positions in `flat`. Roots (level 0) get parent id 0; every
/// other entry points at the closest earlier entry one level up. The walk is
/// a single left-to-right pass; recursion depth is bounded by the deepest
/// indentation in the input.
pub fn rebuild_hierarchy(flat: &[FlatStat]) -> Vec<HierarchicalStat> {
    let mut out = Vec::with_capacity(flat.len());
    let mut idx = 0;
    while idx < flat.len() {
        // A run that starts deeper than level 0 has no parent to hang from;
        // treat its first level as the root level.
        let level = flat[idx].level;
        idx = rebuild_level(flat, level, idx, 0, &mut out);
    }
    out
}

fn rebuild_level(
    flat: &[FlatStat],
    level: usize,
    start: usize,
    parent_id: usize,
    out: &mut Vec<HierarchicalStat>,
) -> usize {
    let mut idx = start;
    let mut previous_id = parent_id;
    while idx < flat.len() {
        let entry = &flat[idx];
        if entry.level < level {
            return idx;
        }
        if entry.level == level {
            out.push(HierarchicalStat {
                name: entry.name.clone(),
                value: entry.value.clone(),
                count: entry.count,
                level: entry.level,
                id: idx,
                parent_id,
            });
            previous_id = idx;
            idx += 1;
        } else {
            idx = rebuild_level(flat, entry.level, idx, previous_id, out);
        }
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_name<'a>(stats: &'a [HierarchicalStat], name: &str) -> &'a HierarchicalStat {
        stats.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn siblings_share_parent_and_roots_point_at_zero() {
        let flat = vec![
            FlatStat::new("A", "1", 0, 0),
            FlatStat::new("B", "2", 1, 0),
            FlatStat::new("C", "3", 1, 0),
            FlatStat::new("D", "4", 0, 0),
        ];
        let tree = rebuild_hierarchy(&flat);
        assert_eq!(tree.len(), 4);
        let a = by_name(&tree, "A");
        assert_eq!(by_name(&tree, "B").parent_id, a.id);
        assert_eq!(by_name(&tree, "C").parent_id, a.id);
        assert_eq!(by_name(&tree, "D").parent_id, 0);
        assert_eq!(by_name(&tree, "D").level, 0);
    }

    #[test]
    fn cook_profile_sample_keeps_input_order() {
        let flat = vec![
            FlatStat::new("Save", "10", 0, 0),
            FlatStat::new("Write", "6", 1, 0),
            FlatStat::new("Serialize", "4", 1, 0),
        ];
        let tree = rebuild_hierarchy(&flat);
        let ids: Vec<usize> = tree.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(tree[1].parent_id, 0);
        assert_eq!(tree[2].parent_id, 0);
        assert_eq!(tree.iter().filter(|s| s.level == 0).count(), 1);
    }

    #[test]
    fn deeper_levels_return_to_the_right_parent() {
        let flat = vec![
            FlatStat::new("root", "", 0, 0),
            FlatStat::new("a", "", 1, 0),
            FlatStat::new("a1", "", 2, 0),
            FlatStat::new("a2", "", 2, 0),
            FlatStat::new("b", "", 1, 0),
            FlatStat::new("b1", "", 2, 0),
            FlatStat::new("root2", "", 0, 0),
            FlatStat::new("c", "", 1, 0),
        ];
        let tree = rebuild_hierarchy(&flat);
        assert_eq!(tree.len(), flat.len());
        assert_eq!(by_name(&tree, "a1").parent_id, by_name(&tree, "a").id);
        assert_eq!(by_name(&tree, "a2").parent_id, by_name(&tree, "a").id);
        assert_eq!(by_name(&tree, "b").parent_id, by_name(&tree, "root").id);
        assert_eq!(by_name(&tree, "b1").parent_id, by_name(&tree, "b").id);
        assert_eq!(by_name(&tree, "c").parent_id, by_name(&tree, "root2").id);

        for stat in tree.iter().filter(|s| s.level > 0) {
            let parent = tree.iter().find(|p| p.id == stat.parent_id).unwrap();
            assert_eq!(parent.level + 1, stat.level);
            assert!(parent.id < stat.id);
        }
    }

    #[test]
    fn output_is_emitted_in_input_order() {
        let flat = vec![
            FlatStat::new("x", "", 0, 0),
            FlatStat::new("y", "", 1, 0),
            FlatStat::new("z", "", 0, 0),
        ];
        let names: Vec<String> = rebuild_hierarchy(&flat).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn store_groups_last_write_wins() {
        let mut store = StatStore::new();
        store.add_stat("Misc", "Packages", "10");
        store.add_stat("Misc", "Packages", "12");
        assert_eq!(store.group("Misc").unwrap()["Packages"], "12");
        assert!(store.has_stats());
    }

    #[test]
    fn sequenced_stats_keep_arrival_order() {
        let mut store = StatStore::new();
        store.add_sequenced_stat("Cooker_Cooked", 5, "1");
        store.add_sequenced_stat("Cooker_Cooked", 3, "2");
        let values: Vec<&str> = store
            .sequence("Cooker_Cooked")
            .unwrap()
            .iter()
            .map(|e| e.value.as_str())
            .collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn hierarchy_json_uses_parent_id_key() {
        let mut store = StatStore::new();
        store.add_hierarchy("CookProfile", &[FlatStat::new("Save", "10", 0, 0)]);
        let json = serde_json::to_value(store.hierarchies()).unwrap();
        assert_eq!(json["CookProfile"][0]["parentId"], 0);
    }
}
