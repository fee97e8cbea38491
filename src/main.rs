use anyhow::Context;
use std::io::{self, BufWriter};
use tracing_subscriber::EnvFilter;

use cpusim::{
    cli::{self, CliCommand},
    config::{OutputFormat, SimConfig, WorkloadSource},
    sim::{
        ConsoleReporter, JsonLinesReporter, RandomWorkload, Reporter, TickLimit, demo_workload,
        load_workload, random_workload,
    },
    ProcessDescriptor, Run, RunSummary, StopToken, new_run,
};

fn main() -> anyhow::Result<()> {
    let config = match cli::parse_args_from(std::env::args().skip(1)) {
        Ok(CliCommand::Run(config)) => config,
        Ok(CliCommand::Help) => {
            print!("{}", cli::USAGE);
            return Ok(());
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    init_tracing(&config);

    let descriptors = workload(&config)?;
    let run = new_run(&descriptors, config.policy, config.quantum)
        .context("refusing to start simulation")?
        .with_fast_forward(config.fast_forward);

    let stdout = BufWriter::new(io::stdout().lock());
    let summary = match config.format {
        OutputFormat::Text => {
            let mut reporter = ConsoleReporter::new(stdout);
            let summary = drive(run, &mut reporter, config.max_ticks);
            reporter.finish().context("writing trace")?;
            summary
        }
        OutputFormat::Json => {
            let mut reporter = JsonLinesReporter::new(stdout);
            let summary = drive(run, &mut reporter, config.max_ticks);
            reporter.finish().context("writing trace")?;
            summary
        }
    };

    if !summary.is_complete() {
        tracing::warn!(
            completed = summary.completed,
            total = summary.total,
            "stopped before all processes finished"
        );
    }
    Ok(())
}

fn init_tracing(config: &SimConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn workload(config: &SimConfig) -> anyhow::Result<Vec<ProcessDescriptor>> {
    Ok(match &config.workload {
        WorkloadSource::Demo => demo_workload(),
        WorkloadSource::File(path) => load_workload(path)?,
        WorkloadSource::Random { count, seed } => random_workload(&RandomWorkload {
            count: *count,
            seed: *seed,
            ..RandomWorkload::default()
        }),
    })
}

fn drive<R: Reporter>(mut run: Run, reporter: &mut R, max_ticks: Option<u64>) -> RunSummary {
    match max_ticks {
        Some(limit) => {
            let stop = StopToken::new();
            if limit == 0 {
                stop.stop();
            }
            let mut limited = TickLimit::new(reporter, limit, stop.clone());
            run.run_until_stopped(&mut limited, &stop).summary().clone()
        }
        None => run.run_to_completion(reporter),
    }
}
