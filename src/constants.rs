// src/constants.rs

// Block names
pub const BLOCK_DEFAULT: &str = "Default";
pub const BLOCK_COMPILER: &str = "Compiler";
pub const BLOCK_CONTENT: &str = "Content";
pub const BLOCK_COOKSTATS: &str = "Cook Stats";
pub const BLOCK_TOOL: &str = "UBT";
pub const BLOCK_TASK: &str = "Task";
pub const BLOCK_GAUNTLET: &str = "Gauntlet";
pub const BLOCK_EVENTS: &str = "Events";
pub const BLOCK_VALIDATEASSET: &str = "Asset Validation";

// Artifact file names
pub const ARTIFACTS_REPORT_JSON: &str = "build-report.json";
pub const ARTIFACTS_ASSETS_JSON: &str = "assets-report.json";
pub const ARTIFACTS_SUMMARY_FILE: &str = "build-summary.json";
pub const ARTIFACTS_STATS_JSON: &str = "stats.json";
pub const ARTIFACTS_SEQUENCE_STATS_JSON: &str = "stats-sequence.json";
pub const ARTIFACTS_HIERARCHICAL_STATS_JSON: &str = "stats-hierarchy.json";

// Stat names
pub const STAT_COOKER_COOKED: &str = "Cooker_Cooked";
pub const STAT_COOKER_REMAIN: &str = "Cooker_Remain";
pub const STAT_COOKER_TOTAL: &str = "Cooker_Total";
pub const STAT_GROUP_TOOL_DURATIONS: &str = "Tool Durations";
pub const STAT_GROUP_DDC_SUMMARY: &str = "DDC Summary Stats";
pub const STAT_GROUP_UNKNOWN: &str = "Unknown";
pub const HIERARCHY_COOK_PROFILE: &str = "CookProfile";
pub const HIERARCHY_TIMER: &str = "HierarchyTimer";

// defaults
pub const DEFAULT_GAUNTLET_COMMAND: &str = "RunUnrealTests";
pub const DEFAULT_TEST_SUITE_NAME: &str = "Gauntlet";
