//! The `adaptest simulate` command.
//!
//! Drives a full session against an item bank with a simulated learner whose
//! answers are drawn from the 2PL model at a fixed true ability.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use adaptest_core::analysis::PatternReport;
use adaptest_core::config::{load_config_from, SessionConfig};
use adaptest_core::engine::{CatEngine, NextStep, SessionOverrides};
use adaptest_core::irt;
use adaptest_core::model::{SessionId, SessionStatus, Submission};
use adaptest_core::parser::{parse_item_bank, validate_item_bank};
use adaptest_core::stopping::StopReason;
use adaptest_core::store::{InMemorySessionStore, SessionService};

/// Simulated response times are drawn uniformly from this range.
const RESPONSE_SECONDS: std::ops::RangeInclusive<u32> = 10..=90;

pub struct SimulateArgs {
    pub bank: PathBuf,
    pub theta: f64,
    pub seed: u64,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub target_precision: Option<f64>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

/// Everything needed to replay or review a simulated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub bank: BankSummary,
    pub true_theta: f64,
    pub seed: u64,
    pub config: SessionConfig,
    pub steps: Vec<SimulationStep>,
    pub status: SessionStatus,
    pub stop_reason: Option<StopReason>,
    pub report: PatternReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub items: usize,
}

/// One administered item and the estimate after it was scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStep {
    pub index: usize,
    pub item_id: String,
    pub knowledge_point_id: String,
    pub difficulty: f64,
    pub expected_information: f64,
    pub correct: bool,
    pub time_spent_seconds: u32,
    pub theta: f64,
    pub standard_error: f64,
}

impl SimulationReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SimulationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    if !args.theta.is_finite() {
        anyhow::bail!("--theta must be a finite number, got {}", args.theta);
    }

    let config = load_config_from(args.config.as_deref())?;
    let bank = parse_item_bank(&args.bank)?;
    for w in validate_item_bank(&bank) {
        match &w.subject {
            Some(subject) => tracing::warn!("[{subject}] {}", w.message),
            None => tracing::warn!("{}", w.message),
        }
    }

    let service = SessionService::new(CatEngine::new(config)?, InMemorySessionStore::new());
    let overrides = SessionOverrides {
        min_items: args.min_items,
        max_items: args.max_items,
        target_precision: args.target_precision,
        ..Default::default()
    };
    let session = service.start(&overrides)?;
    let id = session.id();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut steps = Vec::new();

    if args.format != "json" {
        println!(
            "Simulating {} ({} items) for a learner at theta {:.2}, seed {}",
            bank.name,
            bank.items.len(),
            args.theta,
            args.seed
        );
    }

    loop {
        let (item, expected_information) =
            match service.next_item(id, &bank.items, &bank.knowledge_points)? {
                NextStep::Item(selection) => (
                    selection.item.clone(),
                    selection.rationale.expected_information,
                ),
                NextStep::Finished(_) => break,
            };

        let p = irt::p_correct(args.theta, item.difficulty, item.discrimination).into_logged();
        let correct = rng.gen::<f64>() < p;
        let seconds = rng.gen_range(RESPONSE_SECONDS);

        let outcome = service.record_answer(
            id,
            &item,
            &Submission::new(&item.id, correct).with_time(seconds),
        )?;

        let step = SimulationStep {
            index: steps.len() + 1,
            item_id: item.id.clone(),
            knowledge_point_id: item.knowledge_point_id.clone(),
            difficulty: item.difficulty,
            expected_information,
            correct,
            time_spent_seconds: seconds,
            theta: outcome.estimate.theta,
            standard_error: outcome.estimate.standard_error,
        };
        if args.format != "json" {
            print_step(&step);
        }
        steps.push(step);
    }

    let report = service.finalize(id)?;
    let session = service.get(id)?;

    let simulation = SimulationReport {
        session_id: id,
        created_at: Utc::now(),
        bank: BankSummary {
            id: bank.id.clone(),
            name: bank.name.clone(),
            items: bank.items.len(),
        },
        true_theta: args.theta,
        seed: args.seed,
        config: session.config().clone(),
        steps,
        status: session.status(),
        stop_reason: session.stop_reason(),
        report,
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&simulation)?),
        _ => print_summary(&simulation),
    }

    if let Some(output_dir) = &args.output {
        let path = output_dir.join(format!("simulation-{}.json", simulation.session_id));
        simulation.save_json(&path)?;
        if args.format != "json" {
            println!("\nReport saved to: {}", path.display());
        }
    }

    Ok(())
}

fn print_step(step: &SimulationStep) {
    println!(
        "  {:>3}. {:<24} b={:>5.2}  {}  theta={:>5.2}  se={:.3}",
        step.index,
        step.item_id,
        step.difficulty,
        if step.correct { "correct  " } else { "incorrect" },
        step.theta,
        step.standard_error
    );
}

/// Print the summary table for a finished simulation.
pub fn print_summary(simulation: &SimulationReport) {
    let report = &simulation.report;
    let stop = simulation
        .stop_reason
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("\nSession {} {}", simulation.session_id, simulation.status);

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Stop reason"), Cell::new(stop)]);
    table.add_row(vec![
        Cell::new("Items administered"),
        Cell::new(report.total),
    ]);
    table.add_row(vec![
        Cell::new("Accuracy"),
        Cell::new(format!("{:.1}%", report.accuracy * 100.0)),
    ]);
    table.add_row(vec![
        Cell::new("True theta"),
        Cell::new(format!("{:.2}", simulation.true_theta)),
    ]);
    table.add_row(vec![
        Cell::new("Estimated theta"),
        Cell::new(format!("{:.2}", report.final_ability.theta)),
    ]);
    table.add_row(vec![
        Cell::new("Standard error"),
        Cell::new(format!("{:.3}", report.final_ability.standard_error)),
    ]);
    table.add_row(vec![
        Cell::new("Consistency"),
        Cell::new(format!("{:.2}", report.consistency)),
    ]);
    table.add_row(vec![Cell::new("Trend"), Cell::new(report.trend)]);
    if let Some(avg) = report.average_time_seconds {
        table.add_row(vec![
            Cell::new("Average time"),
            Cell::new(format!("{avg:.1}s")),
        ]);
    }
    println!("{table}");

    if !report.knowledge_points.is_empty() {
        let mut kp_table = Table::new();
        kp_table.set_header(vec!["Knowledge point", "Attempts", "Correct", "Accuracy"]);
        for kp in &report.knowledge_points {
            kp_table.add_row(vec![
                Cell::new(&kp.knowledge_point_id),
                Cell::new(kp.attempts),
                Cell::new(kp.correct),
                Cell::new(format!("{:.0}%", kp.accuracy * 100.0)),
            ]);
        }
        println!("{kp_table}");
    }
}
