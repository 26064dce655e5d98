use crate::config::Settings;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify Unreal BuildGraph console output into diagnostics, stats and test results.", long_about = None)]
pub struct Cli {
    /// TOML settings file.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Workspace root stripped from paths in diagnostics.
    #[arg(long, short = 'r')]
    pub root: Option<String>,

    /// Directory the JSON reports are written to.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    #[arg(long = "gauntlet-command")]
    pub gauntlet_command: Option<String>,

    /// Don't collect stats.
    #[arg(long = "no-stats")]
    pub no_stats: bool,

    /// Don't echo the log.
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Print a summary table when done.
    #[arg(long)]
    pub report: bool,

    /// Exit code of the process that produced the log.
    #[arg(long = "exit-code", default_value_t = 0, allow_negative_numbers = true)]
    pub exit_code: i32,

    /// Log file to read, or "-" for stdin.
    #[arg(default_value = "-")]
    pub log: String,
}

impl Cli {
    /// Settings from `--config` (or defaults) with command line overrides applied.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(root) = &self.root {
            settings.root_path = Some(root.clone());
        }
        if let Some(out) = &self.out {
            settings.output_dir = Some(out.clone());
        }
        if let Some(command) = &self.gauntlet_command {
            settings.gauntlet_command = command.clone();
        }
        if self.no_stats {
            settings.collect_stats = false;
        }
        if self.quiet {
            settings.echo = false;
        }
        Ok(settings)
    }

    pub fn reads_stdin(&self) -> bool {
        self.log == "-"
    }
}
