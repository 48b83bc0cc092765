// Entry point and high-level CLI flow.
//
// - `run` loads the lead, attendance and project-hour tabs, computes the KPI
//   tables and hands them to every configured publisher.
// - `check` stops after loading and prints what was found in each source.
mod aggregate;
mod cli;
mod config;
mod contribution;
mod error;
mod loader;
mod merge;
mod output;
mod pipeline;
mod reports;
mod scoring;
mod types;
mod util;

use crate::cli::{CheckCommand, Commands, RunCommand, StrategyArg};
use crate::config::{KpiConfig, Strategy};
use crate::error::Result;
use crate::loader::{CsvWorkbook, KpiInputs, SourceTabs};
use crate::output::{ArchiveSink, AuditPublisher, MasterPublisher, Publisher};
use crate::types::LoadReport;
use crate::util::format_int;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod exit_code {
    pub const CONFIG_ERROR: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the run configuration once; everything downstream takes it by
/// reference.
fn load_validated(path: Option<&Path>, strategy: Option<StrategyArg>) -> Result<KpiConfig> {
    let mut config = config::load_config(path)?;
    if let Some(arg) = strategy {
        config.publish.strategy = match arg {
            StrategyArg::Audit => Strategy::Audit,
            StrategyArg::Master => Strategy::Master,
            StrategyArg::Both => Strategy::Both,
        };
    }
    config.validate()?;
    Ok(config)
}

fn load_sources(config: &KpiConfig) -> Result<(KpiInputs, Vec<LoadReport>)> {
    let lead_book = CsvWorkbook::new(config.lead_book()?);
    let pdr_book = CsvWorkbook::new(config.pdr_book()?);
    let tabs = SourceTabs {
        lead: &config.tabs.lead,
        attendance: &config.tabs.attendance,
        project_hours: &config.tabs.project_hours,
    };
    let (inputs, reports) = loader::load_inputs(&lead_book, &pdr_book, tabs)?;
    for r in &reports {
        info!(
            "Loaded {}: {} rows ({} keyed)",
            r.source,
            format_int(r.total_rows),
            format_int(r.keyed_rows)
        );
        if r.skipped_rows > 0 {
            warn!("{}: {} undecodable rows skipped", r.source, format_int(r.skipped_rows));
        }
    }
    Ok((inputs, reports))
}

fn publishers(config: &KpiConfig) -> Result<Vec<Box<dyn Publisher>>> {
    let strategy = config.publish.strategy;
    let mut out: Vec<Box<dyn Publisher>> = Vec::new();
    if strategy.includes_audit() {
        let report_book = CsvWorkbook::new(config.report_book()?);
        out.push(Box::new(AuditPublisher::new(report_book)));
    }
    if strategy.includes_master() {
        let master_book = CsvWorkbook::new(config.master_book()?);
        let archive = ArchiveSink::new(config.archive_dir()?, &config.publish.archive_file);
        out.push(Box::new(MasterPublisher::new(master_book, archive)));
    }
    Ok(out)
}

fn handle_run(cmd: RunCommand, quiet: bool) -> Result<()> {
    let config = load_validated(cmd.config.as_deref(), cmd.strategy)?;
    let (inputs, sources) = load_sources(&config)?;

    let kpi = pipeline::run(&inputs);
    if kpi.scored.is_empty() {
        warn!("No lead rows carried both a month and an ID; the final report is empty");
    }
    let report = reports::build_report_set(&kpi, &config.tabs.final_report);

    for mut publisher in publishers(&config)? {
        info!("Publishing with the {} strategy", publisher.name());
        publisher.publish(&report, &sources)?;
    }

    let months: BTreeSet<&str> = kpi
        .scored
        .iter()
        .map(|s| s.merged.core.month.as_str())
        .collect();
    info!(
        "Scored {} lead-months across {} months",
        format_int(kpi.scored.len()),
        format_int(months.len())
    );

    let preview_rows = cmd.preview.unwrap_or(config.publish.preview_rows);
    if !quiet && preview_rows > 0 {
        println!("Lead KPI Report");
        println!("(first {} rows)\n", preview_rows);
        println!("{}\n", output::preview_table(&report.presentation, preview_rows));
    }
    Ok(())
}

/// Requires only the input workbooks; publish destinations are not checked.
fn handle_check(cmd: CheckCommand, quiet: bool) -> Result<()> {
    let config = config::load_config(cmd.config.as_deref())?;
    config.lead_book()?;
    config.pdr_book()?;
    let (inputs, sources) = load_sources(&config)?;
    let groups = aggregate::monthly_core(&inputs.leads).len();
    info!("{} (Month, QAI_ID) groups would be scored", format_int(groups));
    if !quiet {
        println!("{}\n", output::load_summary(&sources));
        println!("Groups to score: {}", format_int(groups));
    }
    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let result = match cli.command {
        Commands::Run(cmd) => handle_run(cmd, cli.quiet),
        Commands::Check(cmd) => handle_check(cmd, cli.quiet),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        let code = if e.is_config() {
            exit_code::CONFIG_ERROR
        } else {
            exit_code::RUNTIME_FAILURE
        };
        std::process::exit(code);
    }
}
