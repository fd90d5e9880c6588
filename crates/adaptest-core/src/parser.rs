//! TOML item bank parser.
//!
//! Loads calibrated item banks from TOML files and directories, and validates
//! them. Item banks are a host-side convenience: the engine itself only ever
//! sees `&[Item]` and `&[KnowledgePoint]`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::InputError;
use crate::model::{Item, KnowledgeLevel, KnowledgePoint, THETA_MAX, THETA_MIN};

/// A named collection of items and the knowledge points they assess.
#[derive(Debug, Clone)]
pub struct ItemBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub knowledge_points: Vec<KnowledgePoint>,
    pub items: Vec<Item>,
}

/// Intermediate TOML structure for parsing item bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    knowledge_points: Vec<TomlKnowledgePoint>,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlKnowledgePoint {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    core: bool,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    #[serde(default)]
    difficulty: Option<f64>,
    #[serde(default)]
    discrimination: Option<f64>,
    knowledge_point: String,
    #[serde(default)]
    content_ref: String,
}

/// Parse a single TOML file into an `ItemBank`.
pub fn parse_item_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    parse_item_bank_str(&content, path)
}

/// Parse a TOML string into an `ItemBank` (useful for testing).
pub fn parse_item_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let knowledge_points = parsed
        .knowledge_points
        .into_iter()
        .map(|kp| {
            let level = kp
                .level
                .map(|l| l.parse::<KnowledgeLevel>().map_err(|e| anyhow::anyhow!("{}", e)))
                .transpose()
                .with_context(|| format!("knowledge point '{}'", kp.id))?;
            Ok(KnowledgePoint {
                id: kp.id,
                name: kp.name,
                is_core: kp.core,
                importance: kp.importance,
                level,
                prerequisites: kp.prerequisites,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let items = parsed
        .items
        .into_iter()
        .map(|i| {
            let difficulty = i
                .difficulty
                .ok_or_else(|| InputError::MissingDifficulty {
                    item_id: i.id.clone(),
                })?;
            Ok(Item {
                id: i.id,
                difficulty,
                discrimination: i.discrimination.unwrap_or(1.0),
                knowledge_point_id: i.knowledge_point,
                content_ref: i.content_ref,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid item bank: {}", source_path.display()))?;

    Ok(ItemBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        knowledge_points,
        items,
    })
}

/// Recursively load all `.toml` item bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_item_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from item bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item or knowledge point id (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an item bank for common issues.
pub fn validate_item_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_items = HashSet::new();
    for item in &bank.items {
        if !seen_items.insert(item.id.as_str()) {
            warnings.push(ValidationWarning {
                subject: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
    }

    let mut known_kps = HashSet::new();
    for kp in &bank.knowledge_points {
        if !known_kps.insert(kp.id.as_str()) {
            warnings.push(ValidationWarning {
                subject: Some(kp.id.clone()),
                message: format!("duplicate knowledge point ID: {}", kp.id),
            });
        }
    }

    for item in &bank.items {
        if let Err(e) = item.validate() {
            warnings.push(ValidationWarning {
                subject: Some(item.id.clone()),
                message: e.to_string(),
            });
        }
        if !(THETA_MIN..=THETA_MAX).contains(&item.difficulty) {
            warnings.push(ValidationWarning {
                subject: Some(item.id.clone()),
                message: format!(
                    "difficulty {} is outside the ability scale [{THETA_MIN}, {THETA_MAX}]",
                    item.difficulty
                ),
            });
        }
        if !known_kps.is_empty() && !known_kps.contains(item.knowledge_point_id.as_str()) {
            warnings.push(ValidationWarning {
                subject: Some(item.id.clone()),
                message: format!("unknown knowledge point: {}", item.knowledge_point_id),
            });
        }
    }

    for kp in &bank.knowledge_points {
        for prereq in &kp.prerequisites {
            if !known_kps.contains(prereq.as_str()) {
                warnings.push(ValidationWarning {
                    subject: Some(kp.id.clone()),
                    message: format!("unknown prerequisite: {prereq}"),
                });
            }
        }
    }

    for kp in &bank.knowledge_points {
        if !bank.items.iter().any(|i| i.knowledge_point_id == kp.id) {
            warnings.push(ValidationWarning {
                subject: Some(kp.id.clone()),
                message: "knowledge point has no items".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[bank]
id = "fractions"
name = "Fractions"
description = "Fraction arithmetic"

[[knowledge_points]]
id = "equivalence"
name = "Equivalent fractions"
core = true
importance = 0.9
level = "foundational"

[[knowledge_points]]
id = "addition"
name = "Adding fractions"
level = "applied"
prerequisites = ["equivalence"]

[[items]]
id = "eq-1"
difficulty = -1.2
knowledge_point = "equivalence"
content_ref = "items/eq-1.md"

[[items]]
id = "add-1"
difficulty = 0.4
discrimination = 1.3
knowledge_point = "addition"
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_item_bank_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(bank.id, "fractions");
        assert_eq!(bank.knowledge_points.len(), 2);
        assert_eq!(bank.items.len(), 2);
        assert!(bank.knowledge_points[0].is_core);
        assert_eq!(
            bank.knowledge_points[1].level,
            Some(KnowledgeLevel::Applied)
        );
        assert_eq!(bank.items[0].discrimination, 1.0);
        assert_eq!(bank.items[1].discrimination, 1.3);
        assert_eq!(bank.items[0].content_ref, "items/eq-1.md");
        assert!(validate_item_bank(&bank).is_empty());
    }

    #[test]
    fn missing_difficulty_is_an_input_error() {
        let toml = r#"
[bank]
id = "broken"
name = "Broken"

[[items]]
id = "no-b"
knowledge_point = "kp"
"#;
        let err = parse_item_bank_str(toml, &PathBuf::from("test.toml")).unwrap_err();
        let input = err.downcast_ref::<InputError>();
        assert!(matches!(
            input,
            Some(InputError::MissingDifficulty { item_id }) if item_id == "no-b"
        ));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let toml = r#"
[bank]
id = "levels"
name = "Levels"

[[knowledge_points]]
id = "kp"
level = "expert"
"#;
        assert!(parse_item_bank_str(toml, &PathBuf::from("test.toml")).is_err());
    }

    #[test]
    fn validate_reports_common_issues() {
        let toml = r#"
[bank]
id = "issues"
name = "Issues"

[[knowledge_points]]
id = "kp"
prerequisites = ["missing"]

[[knowledge_points]]
id = "empty"

[[items]]
id = "dup"
difficulty = 0.0
knowledge_point = "kp"

[[items]]
id = "dup"
difficulty = 4.5
discrimination = -1.0
knowledge_point = "elsewhere"
"#;
        let bank = parse_item_bank_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_item_bank(&bank);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));
        assert!(has("duplicate item ID"));
        assert!(has("non-positive discrimination"));
        assert!(has("outside the ability scale"));
        assert!(has("unknown knowledge point: elsewhere"));
        assert!(has("unknown prerequisite: missing"));
        assert!(has("has no items"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_item_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fractions.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "fractions");
    }
}
