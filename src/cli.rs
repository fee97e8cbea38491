//! Command-line parsing for the `cpusim` binary.
//!
//! Hand-rolled: the grammar is a flat list of flags.
//!
//! ```text
//! cpusim [-a|--algorithm FIFO|SJF|STCF|RR] [-q|--quantum N]
//!        [-w|--workload FILE.json | --random COUNT [--seed N]]
//!        [--format text|json] [--fast-forward] [--max-ticks N] [-v]...
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::config::{OutputFormat, SimConfig, WorkloadSource};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(SimConfig),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("invalid number '{value}' for {flag}")]
    InvalidNumber { flag: String, value: String },

    #[error("unknown output format '{0}'; expected text or json")]
    UnknownFormat(String),

    #[error("unknown argument '{0}'")]
    UnknownFlag(String),

    #[error("--workload and --random are mutually exclusive")]
    ConflictingWorkload,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub const USAGE: &str = "\
usage: cpusim [OPTIONS]

  -a, --algorithm <FIFO|SJF|STCF|RR>  scheduling policy, any case (default FIFO)
  -q, --quantum <N>                   round-robin quantum in ticks (required for RR)
  -w, --workload <FILE>               JSON array of process descriptors
      --random <COUNT>                generate COUNT random processes
      --seed <N>                      seed for --random (default 0)
      --format <text|json>            output format (default text)
      --fast-forward                  skip idle stretches in one call
      --max-ticks <N>                 stop after N ticks
  -v, --verbose                       more logging on stderr (repeatable)
  -h, --help                          print this help
";

pub fn parse_args_from<I, S>(args: I) -> Result<CliCommand, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::<String>::into);
    let mut config = SimConfig::default();
    let mut workload_file: Option<PathBuf> = None;
    let mut random: Option<usize> = None;
    let mut seed: u64 = 0;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-a" | "--algorithm" => {
                config.policy = value(&mut args, &arg)?.parse()?;
            }
            "-q" | "--quantum" => {
                config.quantum = Some(number(&mut args, &arg)?);
            }
            "-w" | "--workload" => {
                workload_file = Some(PathBuf::from(value(&mut args, &arg)?));
            }
            "--random" => random = Some(number(&mut args, &arg)?),
            "--seed" => seed = number(&mut args, &arg)?,
            "--format" => {
                config.format = match value(&mut args, &arg)?.as_str() {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    other => return Err(CliError::UnknownFormat(other.to_owned())),
                }
            }
            "--fast-forward" => config.fast_forward = true,
            "--max-ticks" => config.max_ticks = Some(number(&mut args, &arg)?),
            "-v" | "--verbose" => config.verbose = config.verbose.saturating_add(1),
            _ => return Err(CliError::UnknownFlag(arg)),
        }
    }

    config.workload = match (workload_file, random) {
        (Some(_), Some(_)) => return Err(CliError::ConflictingWorkload),
        (Some(path), None) => WorkloadSource::File(path),
        (None, Some(count)) => WorkloadSource::Random { count, seed },
        (None, None) => WorkloadSource::Demo,
    };

    Ok(CliCommand::Run(config))
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, CliError> {
    args.next()
        .ok_or_else(|| CliError::MissingValue(flag.to_owned()))
}

fn number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, CliError> {
    let raw = value(args, flag)?;
    raw.parse().map_err(|_| CliError::InvalidNumber {
        flag: flag.to_owned(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Policy;

    fn parse(args: &[&str]) -> Result<SimConfig, CliError> {
        match parse_args_from(args.iter().copied())? {
            CliCommand::Run(config) => Ok(config),
            CliCommand::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults_to_fifo_on_demo_set() {
        let config = parse(&[]).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn parses_round_robin_with_quantum() {
        let config = parse(&["--algorithm", "RR", "--quantum", "2"]).unwrap();
        assert_eq!(config.policy, Policy::RoundRobin);
        assert_eq!(config.quantum, Some(2));
    }

    #[test]
    fn keeps_non_positive_quantum_for_run_validation() {
        let config = parse(&["-a", "RR", "-q", "-1"]).unwrap();
        assert_eq!(config.quantum, Some(-1));
    }

    #[test]
    fn unknown_policy_is_a_config_error() {
        assert_eq!(
            parse(&["-a", "MLFQ"]),
            Err(CliError::Config(ConfigError::UnknownPolicy("MLFQ".into())))
        );
    }

    #[test]
    fn reports_flag_problems() {
        assert_eq!(
            parse(&["--quantum"]),
            Err(CliError::MissingValue("--quantum".into()))
        );
        assert_eq!(
            parse(&["-q", "two"]),
            Err(CliError::InvalidNumber {
                flag: "-q".into(),
                value: "two".into()
            })
        );
        assert_eq!(parse(&["--bogus"]), Err(CliError::UnknownFlag("--bogus".into())));
        assert_eq!(
            parse(&["-w", "a.json", "--random", "3"]),
            Err(CliError::ConflictingWorkload)
        );
    }

    #[test]
    fn selects_workload_source() {
        let config = parse(&["--random", "12", "--seed", "9", "--format", "json"]).unwrap();
        assert_eq!(config.workload, WorkloadSource::Random { count: 12, seed: 9 });
        assert_eq!(config.format, OutputFormat::Json);

        let config = parse(&["-w", "procs.json", "--fast-forward", "--max-ticks", "50"]).unwrap();
        assert_eq!(config.workload, WorkloadSource::File("procs.json".into()));
        assert!(config.fast_forward);
        assert_eq!(config.max_ticks, Some(50));
    }

    #[test]
    fn verbosity_counts_repeated_flags() {
        assert_eq!(parse(&["-v", "--verbose", "-v"]).unwrap().verbose, 3);
        assert_eq!(parse(&["-vv"]), Err(CliError::UnknownFlag("-vv".into())));
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(
            parse_args_from(["-a", "RR", "--help"]).unwrap(),
            CliCommand::Help
        );
    }
}
