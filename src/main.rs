use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs::{read_to_string, write};
use std::path::PathBuf;
use std::process::ExitCode;

use oncall_roster::logging::init_cli_logger;
use oncall_roster::{CbcSolver, RawSchedule, Report, RosterFile};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Yaml,
}

/// Assign managers to on-call nights.
#[derive(Debug, Parser)]
#[command(name = "oncall-roster", version)]
struct Cli {
    /// Roster file: nights, availability, config and side constraints
    input: PathBuf,

    /// Raw schedule from an earlier run to stay close to (overrides `prev`)
    #[arg(long)]
    previous: Option<PathBuf>,

    /// Write this run's raw schedule here, for use with --previous later
    #[arg(long)]
    write_raw: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Seconds CBC may spend on each solve
    #[arg(long)]
    time_limit: Option<f64>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_cli_logger(cli.verbose);

    let mut file = RosterFile::from_path(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    if let Some(path) = &cli.previous {
        let buf = read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let previous: RawSchedule = serde_yaml::from_str(&buf)?;
        file.prev = Some(previous);
    }

    let (roster, config) = file.into_roster()?;
    tracing::info!(
        managers = roster.matrix().manager_count(),
        nights = roster.matrix().night_count(),
        "loaded roster"
    );

    let solver = match cli.time_limit {
        Some(seconds) => CbcSolver::new().with_time_limit(seconds),
        None => CbcSolver::new(),
    };
    let result = roster.solve(&config, &solver)?;

    if !result.is_solved() {
        println!("No solution with {:?} ({})", config, result.status());
        return Ok(ExitCode::from(2));
    }

    let report = Report::new(&result, roster.matrix())?;
    match cli.format {
        Format::Text => {
            println!("Found a solution!");
            println!();
            print!("{}", report);
            println!();
            println!("Raw data:");
            print!("{}", report.raw_yaml()?);
        }
        Format::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }

    if let Some(path) = &cli.write_raw {
        write(path, report.raw_yaml()?).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(ExitCode::SUCCESS)
}
