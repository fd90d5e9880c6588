//! The `adaptest inspect` command.

use std::path::PathBuf;

use anyhow::Result;

use super::simulate::{print_summary, SimulationReport};

pub fn execute(report_path: PathBuf) -> Result<()> {
    let simulation = SimulationReport::load_json(&report_path)?;

    println!(
        "Simulation of {} ({} items), true theta {:.2}, seed {}",
        simulation.bank.name, simulation.bank.items, simulation.true_theta, simulation.seed
    );
    println!("Run at {}", simulation.created_at.format("%Y-%m-%d %H:%M:%S UTC"));

    let misses: Vec<_> = simulation.steps.iter().filter(|s| !s.correct).collect();
    if !misses.is_empty() {
        println!("\nIncorrect answers:");
        for step in misses {
            println!(
                "  {:>3}. {} ({}) b={:.2}",
                step.index, step.item_id, step.knowledge_point_id, step.difficulty
            );
        }
    }

    print_summary(&simulation);
    Ok(())
}
