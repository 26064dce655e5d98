//! The outer state machine.
//!
//! [`LogListener`] takes the build's output one line at a time, watches for
//! lines that change what kind of output follows (a new graph node, a tool
//! launch, a compiler banner, a tool finishing) and hands everything else to
//! the parser for the current phase.

use crate::constants::{
    BLOCK_TASK, BLOCK_TOOL, DEFAULT_GAUNTLET_COMMAND, DEFAULT_TEST_SUITE_NAME,
    STAT_GROUP_TOOL_DURATIONS,
};
use crate::parsers::{
    BlockParser, CommandletParser, CompilerParser, CookStatsParser, DataValidationParser,
    DefaultParser, GauntletParser, ParseContext, PhaseParser,
};
use crate::path_stripper::PathStripper;
use crate::patterns::{group, LogPatterns};
use crate::sink::LogSink;
use crate::stat_store::StatStore;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Default,
    ToolRun,
    Compiler,
    Commandlet,
    CookStats,
    Gauntlet,
    DataValidation,
}

/// Where the listener is. A generic task interrupts whatever phase was
/// running; that phase is kept here, still open, and resumes when the task
/// ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Active(Phase),
    Task { interrupted: Phase },
}

impl ListenerState {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ListenerState::Active(phase) => Some(*phase),
            ListenerState::Task { .. } => None,
        }
    }
}

impl Default for ListenerState {
    fn default() -> Self {
        ListenerState::Active(Phase::Default)
    }
}

/// What a trigger line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Phase(Phase),
    Task,
}

struct Parsers {
    default: DefaultParser,
    tool: BlockParser,
    task: BlockParser,
    compiler: CompilerParser,
    commandlet: CommandletParser,
    cook_stats: CookStatsParser,
    gauntlet: GauntletParser,
    data_validation: DataValidationParser,
}

impl Parsers {
    fn phase(&mut self, phase: Phase) -> &mut dyn PhaseParser {
        match phase {
            Phase::Default => &mut self.default,
            Phase::ToolRun => &mut self.tool,
            Phase::Compiler => &mut self.compiler,
            Phase::Commandlet => &mut self.commandlet,
            Phase::CookStats => &mut self.cook_stats,
            Phase::Gauntlet => &mut self.gauntlet,
            Phase::DataValidation => &mut self.data_validation,
        }
    }

    fn state(&mut self, state: ListenerState) -> &mut dyn PhaseParser {
        match state {
            ListenerState::Active(phase) => self.phase(phase),
            ListenerState::Task { .. } => &mut self.task,
        }
    }
}

/// Builds a [`LogListener`]; nothing is usable until [`build`](Self::build)
/// returns.
///
/// ```
/// use ue_buildlog::listener::LogListenerBuilder;
/// use ue_buildlog::sink::TextSink;
///
/// let listener = LogListenerBuilder::new()
///     .with_root_path(r"D:\Build\")
///     .with_stats(true)
///     .build(Box::new(TextSink::new(std::io::sink())))?;
/// assert!(listener.stats().is_some());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LogListenerBuilder {
    root_path: Option<String>,
    stats: bool,
    gauntlet_command: String,
    test_suite_name: String,
    update_progress: bool,
}

impl Default for LogListenerBuilder {
    fn default() -> Self {
        LogListenerBuilder::new()
    }
}

impl LogListenerBuilder {
    pub fn new() -> Self {
        LogListenerBuilder {
            root_path: None,
            stats: false,
            gauntlet_command: DEFAULT_GAUNTLET_COMMAND.to_string(),
            test_suite_name: DEFAULT_TEST_SUITE_NAME.to_string(),
            update_progress: true,
        }
    }

    /// Prefix removed from paths in diagnostics.
    pub fn with_root_path(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        self.root_path = if root.is_empty() { None } else { Some(root) };
        self
    }

    /// Attach a [`StatStore`] to collect stats into.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats = enabled;
        self
    }

    /// AutomationTool command that marks a Gauntlet test run.
    pub fn with_gauntlet_command(mut self, command: impl Into<String>) -> Self {
        self.gauntlet_command = command.into();
        self
    }

    pub fn with_test_suite_name(mut self, name: impl Into<String>) -> Self {
        self.test_suite_name = name.into();
        self
    }

    pub fn with_update_progress(mut self, enabled: bool) -> Self {
        self.update_progress = enabled;
        self
    }

    pub fn build(self, sink: Box<dyn LogSink>) -> Result<LogListener> {
        let patterns = LogPatterns::new()?;
        let stripper = match &self.root_path {
            Some(root) => PathStripper::new(root),
            None => PathStripper::disabled(),
        };
        log::debug!(
            "listener: root={:?} stats={} gauntlet={} progress={}",
            self.root_path,
            self.stats,
            self.gauntlet_command,
            self.update_progress
        );
        Ok(LogListener {
            sink,
            patterns,
            stripper,
            stats: self.stats.then(StatStore::new),
            gauntlet_command: self.gauntlet_command.to_lowercase(),
            parsers: Parsers {
                default: DefaultParser,
                tool: BlockParser::new(BLOCK_TOOL),
                task: BlockParser::new(BLOCK_TASK),
                compiler: CompilerParser::new(),
                commandlet: CommandletParser::new(self.update_progress),
                cook_stats: CookStatsParser::new(),
                gauntlet: GauntletParser::new(&self.test_suite_name),
                data_validation: DataValidationParser::new(),
            },
            state: ListenerState::default(),
            node: None,
        })
    }
}

pub struct LogListener {
    sink: Box<dyn LogSink>,
    patterns: LogPatterns,
    stripper: PathStripper,
    stats: Option<StatStore>,
    /// lowercased
    gauntlet_command: String,
    parsers: Parsers,
    state: ListenerState,
    node: Option<String>,
}

impl LogListener {
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Name of the graph node block currently open, if any.
    pub fn current_node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn stats(&self) -> Option<&StatStore> {
        self.stats.as_ref()
    }

    pub fn into_stats(self) -> Option<StatStore> {
        self.stats
    }

    pub fn process_started(&mut self, cmdline: &str) -> Result<()> {
        self.sink.process_started(cmdline)
    }

    /// Forwards the exit code to the sink. Call [`finish`](Self::finish)
    /// first so nothing is still pending.
    pub fn process_finished(&mut self, exit_code: i32) -> Result<()> {
        self.sink.process_finished(exit_code)
    }

    /// One line of standard output.
    pub fn on_line(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        if let Some(caps) = self.patterns.step_marker.captures(text) {
            let name = format!("Node {} (of {})", group(&caps, 1), group(&caps, 2));
            return self.change_node(&name, group(&caps, 3));
        }

        let state = self.state;
        let handled = match state {
            ListenerState::Active(Phase::Default) | ListenerState::Active(Phase::Compiler) => {
                self.launch(text)?
            }
            ListenerState::Active(Phase::ToolRun)
            | ListenerState::Task { .. }
            | ListenerState::Active(Phase::CookStats) => self.took(text)? || self.launch(text)?,
            ListenerState::Active(Phase::Commandlet) => {
                self.took(text)? || self.cook_finished(text)? || self.launch(text)?
            }
            ListenerState::Active(Phase::Gauntlet) => self.took(text)?,
            ListenerState::Active(Phase::DataValidation) => {
                self.took(text)? || self.validation_summary(text)?
            }
        };
        if handled {
            return Ok(());
        }
        self.with_parser(state, |parser, cx| parser.process_line(cx, text))
    }

    /// One line of standard error.
    pub fn on_error_line(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let state = self.state;
        self.with_parser(state, |parser, cx| parser.process_error(cx, text))
    }

    /// End of stream: flushes whatever is pending and closes every open
    /// block. Safe to call more than once.
    pub fn finish(&mut self) -> Result<()> {
        self.leave_all("")?;
        self.state = ListenerState::default();
        if let Some(node) = self.node.take() {
            self.sink.close_block(&node)?;
        }
        Ok(())
    }

    fn with_parser<R>(
        &mut self,
        state: ListenerState,
        f: impl FnOnce(&mut dyn PhaseParser, &mut ParseContext<'_>) -> Result<R>,
    ) -> Result<R> {
        let LogListener {
            sink,
            patterns,
            stripper,
            stats,
            parsers,
            ..
        } = self;
        let mut cx = ParseContext::new(sink.as_mut(), patterns, stripper, stats.as_mut());
        f(parsers.state(state), &mut cx)
    }

    /// Leaves the active parser and, under a task, the phase it interrupted.
    fn leave_all(&mut self, text: &str) -> Result<()> {
        let state = self.state;
        self.with_parser(state, |parser, cx| parser.on_leave(cx, text))?;
        if let ListenerState::Task { interrupted } = state {
            self.with_parser(ListenerState::Active(interrupted), |parser, cx| {
                parser.on_leave(cx, "")
            })?;
        }
        Ok(())
    }

    fn change_node(&mut self, name: &str, description: &str) -> Result<()> {
        self.leave_all("")?;
        if let Some(node) = self.node.take() {
            self.sink.close_block(&node)?;
        }
        log::debug!("node: {} ({})", name, description);
        self.state = ListenerState::default();
        self.sink.open_block(name, description)?;
        self.node = Some(name.to_string());
        Ok(())
    }

    /// Moves to `next`. `text` is the line that caused it; with
    /// `text_for_new_state` it is handed to the new parser's `on_enter`,
    /// otherwise to the old parser's `on_leave`.
    fn set_state(
        &mut self,
        next: Next,
        description: &str,
        text: &str,
        text_for_new_state: bool,
    ) -> Result<()> {
        let current = self.state;
        if next == Next::Phase(Phase::Default) && current == ListenerState::Active(Phase::Default) {
            return self.with_parser(current, |parser, cx| parser.process_line(cx, text));
        }
        let (leave_text, enter_text) = if text_for_new_state {
            ("", text)
        } else {
            (text, "")
        };

        let new_state = match (next, current) {
            // the interrupted phase stays open underneath the task
            (Next::Task, ListenerState::Active(phase)) => ListenerState::Task { interrupted: phase },
            (Next::Task, ListenerState::Task { interrupted }) => {
                self.with_parser(current, |parser, cx| parser.on_leave(cx, leave_text))?;
                ListenerState::Task { interrupted }
            }
            (Next::Phase(phase), _) => {
                self.with_parser(current, |parser, cx| parser.on_leave(cx, leave_text))?;
                if let ListenerState::Task { interrupted } = current {
                    self.with_parser(ListenerState::Active(interrupted), |parser, cx| {
                        parser.on_leave(cx, "")
                    })?;
                }
                ListenerState::Active(phase)
            }
        };

        log::debug!("phase {:?} -> {:?}: {}", current, new_state, description);
        self.state = new_state;
        self.with_parser(new_state, |parser, cx| {
            parser.on_enter(cx, enter_text, description)
        })
    }

    /// Works out which phase a `Running: ...exe` line starts.
    fn classify_launch(&self, text: &str) -> Option<(Next, String)> {
        let patterns = &self.patterns;
        let caps = patterns.task_start.captures(text)?;
        let (exe, params) = (group(&caps, 1), group(&caps, 2));
        let exe_lower = exe.to_lowercase();

        if exe_lower.ends_with("editor-cmd") {
            return Some(match patterns.commandlet_name.captures(params) {
                Some(c) => {
                    let name = group(&c, 1);
                    let phase = if name == "DataValidation" {
                        Phase::DataValidation
                    } else {
                        Phase::Commandlet
                    };
                    (Next::Phase(phase), format!("Commandlet: {}", name))
                }
                None => (Next::Phase(Phase::Commandlet), "Editor-cmd".to_string()),
            });
        }

        if exe_lower.ends_with("dotnet") {
            let Some(module) = patterns.dotnet_module.captures(params) else {
                return Some((Next::Phase(Phase::Commandlet), exe.to_string()));
            };
            let dll = group(&module, 1);
            let unquoted = patterns.quoted_section.replace_all(group(&module, 2), "");
            let args = unquoted
                .trim()
                .split(' ')
                .filter(|a| !a.trim().is_empty() && !a.starts_with('-'))
                .collect::<Vec<_>>()
                .join(" ");
            let phase = match dll {
                "UnrealBuildTool" => Phase::ToolRun,
                "AutomationTool" if args.to_lowercase().starts_with(&self.gauntlet_command) => {
                    Phase::Gauntlet
                }
                _ => Phase::Commandlet,
            };
            return Some((Next::Phase(phase), format!("{} ({})", args, dll)));
        }

        Some((Next::Task, exe.to_string()))
    }

    /// Tool launches and compiler banners.
    fn launch(&mut self, text: &str) -> Result<bool> {
        if let Some((next, description)) = self.classify_launch(text) {
            self.set_state(next, &description, text, true)?;
            return Ok(true);
        }
        if self.patterns.compiler_start.is_match(text) || self.patterns.compiler_start_alt.is_match(text) {
            self.set_state(Next::Phase(Phase::Compiler), text, "", true)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// `Took Ns to run X, ExitCode=N`.
    fn took(&mut self, text: &str) -> Result<bool> {
        let Some(caps) = self.patterns.task_end.captures(text) else {
            return Ok(false);
        };
        let state = self.state;
        match state {
            ListenerState::Active(Phase::ToolRun) | ListenerState::Task { .. } => {
                let (seconds, tool) = (group(&caps, 1), group(&caps, 2));
                self.sink.message(text)?;
                self.sink.stat(tool, seconds)?;
                if let Some(stats) = self.stats.as_mut() {
                    stats.add_stat(STAT_GROUP_TOOL_DURATIONS, tool, seconds);
                }
                self.with_parser(state, |parser, cx| parser.on_leave(cx, ""))?;
                // the interrupted phase was never left, so it is not re-entered
                self.state = match state {
                    ListenerState::Task { interrupted } => ListenerState::Active(interrupted),
                    _ => ListenerState::default(),
                };
                log::debug!("{} finished in {}s, back to {:?}", tool, seconds, self.state);
            }
            _ => self.set_state(Next::Phase(Phase::Default), "", text, false)?,
        }
        Ok(true)
    }

    fn cook_finished(&mut self, text: &str) -> Result<bool> {
        if !self.patterns.cook_end_marker.is_match(text) {
            return Ok(false);
        }
        self.set_state(Next::Phase(Phase::CookStats), "", text, true)?;
        Ok(true)
    }

    fn validation_summary(&mut self, text: &str) -> Result<bool> {
        if !self.patterns.warning_error_summary.is_match(text) {
            return Ok(false);
        }
        self.set_state(Next::Phase(Phase::Default), "", text, true)?;
        Ok(true)
    }
}
