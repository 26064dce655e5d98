//! # ue-buildlog
//!
//! Reads Unreal BuildGraph console output from a file or stdin, echoes it,
//! and writes deduplicated diagnostics and stats as JSON.
//!
//! ## Quick Start
//! ```sh
//! ue-buildlog --root 'D:\Build\Project\' --out artifacts build.log
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use ue_buildlog::prelude::*;
use ue_buildlog::{generate_comfy_report, write_artifacts, Cli};

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    debug!("settings: {:?}", settings);

    let build_store = shared_store(BlockFilter::All);
    let asset_store = shared_store(BlockFilter::asset_validation());

    let mut sinks = SinkFanout::new()
        .with(Box::new(StoreSink::new(build_store.clone())))
        .with(Box::new(StoreSink::new(asset_store.clone())));
    if settings.echo {
        sinks.push(Box::new(TextSink::new(io::stdout())));
    }

    let mut listener = settings.listener_builder().build(Box::new(sinks))?;
    listener.process_started(&cli.log)?;

    let mut feeder = LineFeeder::new();
    if cli.reads_stdin() {
        feeder.run(io::stdin().lock(), &mut listener)?;
    } else {
        let file = File::open(&cli.log).with_context(|| format!("failed to open {}", cli.log))?;
        feeder.run(BufReader::new(file), &mut listener)?;
    }
    listener.process_finished(cli.exit_code)?;
    info!("{} lines read from {}", feeder.lines_read(), cli.log);

    let stats = listener.into_stats();
    let build = build_store.borrow();
    let assets = asset_store.borrow();

    if let Some(dir) = &settings.output_dir {
        let written = write_artifacts(dir, &build, &assets, stats.as_ref())?;
        info!("{} artifacts written to {}", written.len(), dir.display());
    }

    if cli.report {
        println!(
            "{}",
            generate_comfy_report(&[("build", &*build), ("assets", &*assets)], stats.as_ref())
        );
    }
    Ok(())
}
