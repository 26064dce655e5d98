//! Every line shape the engine recognises, compiled once.
//!
//! A [`LogPatterns`] is built when the listener is built and is only ever
//! borrowed afterwards.

use anyhow::{Context, Result};
use regex::Regex;

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid log pattern: {}", pattern))
}

#[derive(Debug, Clone)]
pub struct LogPatterns {
    // listener: phase transitions
    pub step_marker: Regex,
    pub task_start: Regex,
    pub task_end: Regex,
    pub dotnet_module: Regex,
    pub quoted_section: Regex,
    pub commandlet_name: Regex,
    pub compiler_start: Regex,
    pub compiler_start_alt: Regex,
    pub cook_end_marker: Regex,
    pub warning_error_summary: Regex,

    // compiler
    pub compiler_diagnostic: Regex,
    pub compiler_continuation: Regex,
    pub caret_first: Regex,

    // commandlet / data validation
    pub content_diagnostic: Regex,
    pub content_terminator: Regex,
    pub asset_log: Regex,
    pub asset_check_test: Regex,
    pub asset_validating: Regex,
    pub script_call_stack: Regex,
    pub callstack_start: Regex,
    pub callstack_end: Regex,
    pub cook_progress: Regex,
    pub cook_diagnostics: Regex,
    pub cook_diagnostic_stat: Regex,

    // cook stats
    pub simple_stat: Regex,
    pub profile_stat: Regex,
    pub timer_stat: Regex,
    pub stat_text: Regex,
    pub misc_stats_start: Regex,
    pub cook_profile_start: Regex,
    pub ddc_resources_start: Regex,
    pub ddc_summary_start: Regex,
    pub hierarchy_timer_start: Regex,

    // gauntlet
    pub test_started: Regex,
    pub test_completed: Regex,
    pub begin_events: Regex,
    pub end_events: Regex,
    pub event_diagnostic: Regex,
    pub configuration_arg: Regex,
    pub platform_arg: Regex,
}

impl LogPatterns {
    pub fn new() -> Result<Self> {
        Ok(LogPatterns {
            step_marker: compile(r"\*\*\*\*\*\* \[(\d+)/(\d+)\] (.*)")?,
            task_start: compile(r"^\s*Running: .*\\(.+)\.[Ee][Xx][Ee] (.+)")?,
            task_end: compile(r"^\s*Took ([\d\.]+)s to run (.+), ExitCode=(\d+)")?,
            dotnet_module: compile(r#"".*\\(.*?)\.dll".(.*)"#)?,
            quoted_section: compile(r#""[\S\s]*?""#)?,
            commandlet_name: compile(r"-run=(\S*)")?,
            compiler_start: compile(r"^Building \d+ actions with \d+ processes")?,
            compiler_start_alt: compile(r"^------ Building \d* action\(s\) started ------")?,
            cook_end_marker: compile(r"LogCook: Display: Finishing up\.\.\.")?,
            warning_error_summary: compile(
                r"LogInit: Display: Warning/Error Summary \(Unique only\)",
            )?,

            compiler_diagnostic: compile(
                r"^(\s*)(.*): (warning|error|fatal error):? (?:(.+?): )?(.*)",
            )?,
            compiler_continuation: compile(r"^(?:        |\t\t|(.*)(: note:.*))")?,
            caret_first: compile(r"^\s*\^")?,

            content_diagnostic: compile(r"^(\s*)(.+?): (Warning|Error): (.*)")?,
            content_terminator: compile(r"^\s*.+?: (Display|Warning|Error|Fatal|Info): (.*)")?,
            asset_log: compile(r"\[AssetLog\] (.+)\.u(?:map|asset): (.+)")?,
            asset_check_test: compile(r"(.+) \((.+)\)")?,
            asset_validating: compile(r"^\s*LogContentValidation: .*: Validating (.+?) .+")?,
            script_call_stack: compile(r"Script call stack:")?,
            callstack_start: compile(r"begin: stack for UAT")?,
            callstack_end: compile(r"end: stack for UAT")?,
            cook_progress: compile(
                r"^.+?: Display: Cooked packages (\d+) Packages Remain (\d+) Total (\d+)",
            )?,
            cook_diagnostics: compile(r"^\s*.+?: Display: Cook Diagnostics:(.*)")?,
            cook_diagnostic_stat: compile(r"(\w+)=(\d+)")?,

            simple_stat: compile(r"^.*:\s+([^\s=]+)\s*=\s*([^\s=]+)")?,
            profile_stat: compile(r"^[^:]*: [^:]*: ([\d\. ]+)([^=]+)=([\d\.]+)")?,
            timer_stat: compile(r"^[^:]*: [^:]*: (\s+)([^:]+): ([\d\.]+).*\((\d+)\)")?,
            stat_text: compile(r"^[^:]*: [^:]*:\s+(.+)")?,
            misc_stats_start: compile(r"Display: Misc Cook Stats")?,
            cook_profile_start: compile(r"Display: Cook Profile")?,
            ddc_resources_start: compile(r"DDC Resource Stats")?,
            ddc_summary_start: compile(r"DDC Summary Stats")?,
            hierarchy_timer_start: compile(r"Hierarchy Timer Information")?,

            test_started: compile(r"Test Started\. Name=\{(.+?)\} Path=\{(.+?)\}")?,
            test_completed: compile(
                r"Test Completed\. Result=\{(.+?)\} Name=\{(.+?)\} Path=\{(.+?)\}",
            )?,
            begin_events: compile(r"LogAutomationController: BeginEvents: (.+)")?,
            end_events: compile(r"LogAutomationController: EndEvents: (.+)")?,
            // The automation framework spells these with digits so its own
            // event echo is not mistaken for an engine diagnostic.
            event_diagnostic: compile(r"^(\s*)(.+?): (Warn1ng|Err0r): (.*)")?,
            configuration_arg: compile(r"-Configuration=(\S+)")?,
            platform_arg: compile(r"-Platform=(\S+)")?,
        })
    }
}

/// Text of capture group `i`, or "" when it did not participate.
pub(crate) fn group<'t>(caps: &regex::Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        LogPatterns::new().unwrap();
    }

    #[test]
    fn msvc_diagnostic_splits_source_code_and_text() {
        let p = LogPatterns::new().unwrap();
        let caps = p
            .compiler_diagnostic
            .captures("Foo.cpp(10): error C2065: 'x': undeclared identifier")
            .unwrap();
        assert_eq!(group(&caps, 2), "Foo.cpp(10)");
        assert_eq!(group(&caps, 3), "error");
        assert_eq!(group(&caps, 4), "C2065");
        assert_eq!(group(&caps, 5), "'x': undeclared identifier");
    }

    #[test]
    fn clang_diagnostic_has_no_code() {
        let p = LogPatterns::new().unwrap();
        let caps = p
            .compiler_diagnostic
            .captures("/src/Foo.cpp:10:5: error: use of undeclared identifier 'x'")
            .unwrap();
        assert_eq!(group(&caps, 2), "/src/Foo.cpp:10:5");
        assert_eq!(group(&caps, 4), "");
        assert_eq!(group(&caps, 5), "use of undeclared identifier 'x'");
    }

    #[test]
    fn task_start_picks_executable_and_arguments() {
        let p = LogPatterns::new().unwrap();
        let caps = p
            .task_start
            .captures(r"Running: D:\UE\Engine\Binaries\Win64\UnrealEditor-Cmd.exe Game.uproject -run=Cook")
            .unwrap();
        assert_eq!(group(&caps, 1), "UnrealEditor-Cmd");
        assert_eq!(group(&caps, 2), "Game.uproject -run=Cook");
    }

    #[test]
    fn event_diagnostic_ignores_real_spelling() {
        let p = LogPatterns::new().unwrap();
        assert!(p.event_diagnostic.is_match("LogTemp: Err0r: x"));
        assert!(!p.event_diagnostic.is_match("LogTemp: Error: x"));
    }
}
