//! `scheduler` CLI: the two commands named in the external interface
//! contract — `build` runs the full synthesis pipeline and writes a
//! schedule copy, `validate` re-checks an already-built one. Neither
//! command ever overwrites its input file.
//!
//! Real `.xlsm`/`.xlsx` reading and writing is not implemented here (a
//! peripheral, non-goal concern — see [`residency_scheduler::workbook`]);
//! this binary drives the pipeline against [`MemoryWorkbook`] so the CLI
//! surface, config loading, logging, and exit-code contract can be
//! exercised end to end ahead of a real spreadsheet reader.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use residency_scheduler::config::AppConfig;
use residency_scheduler::pipeline;
use residency_scheduler::workbook::{MemoryWorkbook, WorkbookSink, WorkbookSource};

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(about = "Academic-year rotation schedule synthesis for a radiology residency program")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an optional scheduler.toml, beside the input workbook by
    /// default. Required unless every setting is supplied via flags.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full synthesis pipeline and write a schedule copy.
    Build {
        /// The roster/catalog/envelope workbook.
        input: PathBuf,
        /// The preference-survey workbook.
        prefs: PathBuf,
        /// Solve and validate but never write an output file.
        #[arg(long)]
        dry_run: bool,
        /// Output file (a fresh copy; the input is never overwritten).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Target academic year, overriding scheduler.toml.
        #[arg(short = 'y', long)]
        year: Option<i32>,
    },
    /// Re-run the validator against an already-built schedule.
    Validate {
        /// The workbook holding the previously-written schedule.
        input: PathBuf,
    },
}

fn init_logging(config: Option<&AppConfig>) {
    let filter = config
        .map(|c| c.logging.filter.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();
}

fn load_config(path: Option<&PathBuf>, year_override: Option<i32>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(p) => AppConfig::from_file(p).with_context(|| format!("loading config from {}", p.display()))?,
        None => anyhow::bail!(
            "no scheduler.toml supplied (--config); target_year and core_exam_block have no safe default"
        ),
    };
    if let Some(year) = year_override {
        config.scheduling.target_year = year;
    }
    Ok(config)
}

/// Stand-in for the not-yet-implemented `.xlsm`/`.xlsx` reader: any real
/// file path is rejected so the CLI fails loudly rather than silently
/// solving against nothing.
fn load_workbook(input: &PathBuf, prefs: &PathBuf) -> anyhow::Result<MemoryWorkbook> {
    anyhow::bail!(
        "reading a real workbook ({}, {}) is not implemented; only --dry-run against the built-in demo roster is supported",
        input.display(),
        prefs.display()
    )
}

/// A tiny built-in roster used by `--dry-run`, one resident per PGY year,
/// so the full pipeline can be exercised end to end ahead of a real
/// workbook reader.
fn demo_workbook() -> MemoryWorkbook {
    use residency_scheduler::domain::rotation::{HospitalSystem, RotationCode};
    use residency_scheduler::domain::{PathwaySet, Pgy, PreferenceRecord, Resident, Section};
    use residency_scheduler::solvers::r3_builder::AirpSession;

    let resident = |name: &str, pgy: Pgy| Resident {
        name: name.to_string(),
        future_pgy: pgy,
        pathways: PathwaySet::new(),
        preferences: PreferenceRecord::default(),
        historical_weeks: Default::default(),
    };

    let mut wb = MemoryWorkbook::new();
    wb.residents = vec![
        resident("demo_r1", Pgy::R1),
        resident("demo_r2", Pgy::R2),
        resident("demo_r3", Pgy::R3),
        resident("demo_r4", Pgy::R4),
    ];
    for (code, section, pgys) in [
        ("R1a", Section::Other, vec![Pgy::R1]),
        ("R2a", Section::Msk, vec![Pgy::R2]),
        ("Mnuc", Section::NucMed, vec![Pgy::R3, Pgy::R4]),
        ("R4msk", Section::Msk, vec![Pgy::R4]),
    ] {
        wb.catalog.insert(RotationCode {
            code: code.to_string(),
            hospital_system: HospitalSystem::Ucsf,
            section,
            eligible_pgy: pgys.into_iter().collect(),
            participates_nf: code == "Mnuc",
        });
    }
    wb.r1_base_sequence = vec!["R1a".to_string()];
    wb.r2_base_sequence = vec!["R2a".to_string()];
    wb.core_exam_block = 6;
    wb.airp_sessions = vec![AirpSession {
        id: 1,
        block: 1,
        min_seats: 0,
        max_seats: 1,
    }];
    wb
}

fn run_build(
    input: PathBuf,
    prefs: PathBuf,
    dry_run: bool,
    out: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<ExitCode> {
    let workbook = if dry_run {
        info!("--dry-run: solving against the built-in demo roster");
        demo_workbook()
    } else {
        load_workbook(&input, &prefs)?
    };

    let wb_input = workbook
        .load()
        .context("loading workbook input")?;

    let outcome = pipeline::run(&wb_input, config);
    let output = match outcome {
        Ok(output) => output,
        Err(residency_scheduler::SchedulerError::Infeasibility { constraint, detail }) => {
            error!(%constraint, %detail, "build infeasible");
            return Ok(ExitCode::from(2));
        }
        Err(residency_scheduler::SchedulerError::Validation(report)) => {
            for finding in report.findings() {
                error!(message = %finding.message, "validation error");
            }
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e).context("running synthesis pipeline"),
    };

    if !output.report.is_ok() {
        warn!(
            errors = output.report.error_count(),
            warnings = output.report.warning_count(),
            "build completed with validation errors"
        );
        return Ok(ExitCode::from(1));
    }

    if dry_run {
        info!("--dry-run: schedule solved and validated, not written");
        return Ok(ExitCode::SUCCESS);
    }

    let mut sink = MemoryWorkbook::new();
    sink.write_schedule(&output.grid)
        .context("writing schedule output")?;

    let destination = out.unwrap_or_else(|| PathBuf::from("schedule_out.xlsm"));
    info!(path = %destination.display(), "schedule ready (write target not yet implemented)");
    Ok(ExitCode::SUCCESS)
}

fn run_validate(input: PathBuf, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let workbook = load_workbook(&input, &input)?;
    let wb_input = workbook.load().context("loading workbook input")?;
    let Some(grid) = workbook
        .load_existing_grid(&wb_input.residents)
        .context("loading existing schedule from workbook")?
    else {
        anyhow::bail!("workbook at {} has no previously-written schedule to validate", input.display());
    };

    let report = residency_scheduler::validate::validate_all(
        &wb_input.residents,
        &grid,
        &wb_input.catalog,
        &wb_input.envelope,
        &wb_input.requirements,
        config.scheduling.target_year,
    );

    for finding in report.findings() {
        match finding.severity {
            residency_scheduler::validate::Severity::Error => {
                error!(message = %finding.message, "validation error")
            }
            residency_scheduler::validate::Severity::Warning => {
                warn!(message = %finding.message, "validation warning")
            }
        }
    }

    if report.is_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Build { year, .. } => load_config(cli.config.as_ref(), *year),
        Commands::Validate { .. } => load_config(cli.config.as_ref(), None),
    };

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            init_logging(None);
            error!("{e:#}");
            return ExitCode::from(3);
        }
    };

    init_logging(Some(&config));

    let result = match cli.command {
        Commands::Build { input, prefs, dry_run, out, .. } => {
            run_build(input, prefs, dry_run, out, &config)
        }
        Commands::Validate { input } => run_validate(input, &config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(3)
        }
    }
}
