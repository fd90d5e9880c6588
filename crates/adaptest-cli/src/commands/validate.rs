//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = if bank_path.is_dir() {
        adaptest_core::parser::load_bank_directory(&bank_path)?
    } else {
        vec![adaptest_core::parser::parse_item_bank(&bank_path)?]
    };

    let mut total_warnings = 0;

    for bank in &banks {
        println!(
            "Item bank: {} ({} items, {} knowledge points)",
            bank.name,
            bank.items.len(),
            bank.knowledge_points.len()
        );

        let warnings = adaptest_core::parser::validate_item_bank(bank);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All item banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
