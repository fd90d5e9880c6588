//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create adaptest.toml
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    // Create example item bank
    std::fs::create_dir_all("item-banks")?;
    let example_path = std::path::Path::new("item-banks/example.toml");
    if example_path.exists() {
        println!("item-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ITEM_BANK)?;
        println!("Created item-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Tune adaptest.toml for your test length and precision");
    println!("  2. Run: adaptest validate --bank item-banks/example.toml");
    println!("  3. Run: adaptest simulate --bank item-banks/example.toml --theta 0.5");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

[session]
min_items = 10
max_items = 30
target_precision = 0.3
initial_theta = 0.0
initial_se = 1.0

[selection]
breadth_bonus = 2.0
breadth_threshold = 2

[stopping]
streak_length = 5
streak_stop_fraction = 0.8
"#;

const EXAMPLE_ITEM_BANK: &str = r#"[bank]
id = "example"
name = "Example Arithmetic Bank"
description = "A small calibrated bank to get started"

[[knowledge_points]]
id = "counting"
name = "Counting"
level = "foundational"
core = true
importance = 0.9

[[knowledge_points]]
id = "addition"
name = "Addition"
level = "foundational"
importance = 0.7
prerequisites = ["counting"]

[[knowledge_points]]
id = "multiplication"
name = "Multiplication"
level = "applied"
importance = 0.6
prerequisites = ["addition"]

[[knowledge_points]]
id = "word-problems"
name = "Word problems"
level = "synthesis"
importance = 0.5
prerequisites = ["multiplication"]

[[items]]
id = "counting-1"
difficulty = -2.5
discrimination = 0.8
knowledge_point = "counting"
content_ref = "items/counting-1.md"

[[items]]
id = "counting-2"
difficulty = -2.0
discrimination = 1.0
knowledge_point = "counting"
content_ref = "items/counting-2.md"

[[items]]
id = "counting-3"
difficulty = -1.5
discrimination = 1.2
knowledge_point = "counting"
content_ref = "items/counting-3.md"

[[items]]
id = "counting-4"
difficulty = -1.0
discrimination = 1.4
knowledge_point = "counting"
content_ref = "items/counting-4.md"

[[items]]
id = "addition-1"
difficulty = -1.5
discrimination = 0.8
knowledge_point = "addition"
content_ref = "items/addition-1.md"

[[items]]
id = "addition-2"
difficulty = -1.0
discrimination = 1.0
knowledge_point = "addition"
content_ref = "items/addition-2.md"

[[items]]
id = "addition-3"
difficulty = -0.5
discrimination = 1.2
knowledge_point = "addition"
content_ref = "items/addition-3.md"

[[items]]
id = "addition-4"
difficulty = 0.0
discrimination = 1.4
knowledge_point = "addition"
content_ref = "items/addition-4.md"

[[items]]
id = "multiplication-1"
difficulty = -0.5
discrimination = 0.8
knowledge_point = "multiplication"
content_ref = "items/multiplication-1.md"

[[items]]
id = "multiplication-2"
difficulty = 0.0
discrimination = 1.0
knowledge_point = "multiplication"
content_ref = "items/multiplication-2.md"

[[items]]
id = "multiplication-3"
difficulty = 0.5
discrimination = 1.2
knowledge_point = "multiplication"
content_ref = "items/multiplication-3.md"

[[items]]
id = "multiplication-4"
difficulty = 1.0
discrimination = 1.4
knowledge_point = "multiplication"
content_ref = "items/multiplication-4.md"

[[items]]
id = "word-problems-1"
difficulty = 0.5
discrimination = 0.8
knowledge_point = "word-problems"
content_ref = "items/word-problems-1.md"

[[items]]
id = "word-problems-2"
difficulty = 1.0
discrimination = 1.0
knowledge_point = "word-problems"
content_ref = "items/word-problems-2.md"

[[items]]
id = "word-problems-3"
difficulty = 1.5
discrimination = 1.2
knowledge_point = "word-problems"
content_ref = "items/word-problems-3.md"

[[items]]
id = "word-problems-4"
difficulty = 2.0
discrimination = 1.4
knowledge_point = "word-problems"
content_ref = "items/word-problems-4.md"
"#;
