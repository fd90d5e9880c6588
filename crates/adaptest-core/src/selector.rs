//! Maximum-information item selection.
//!
//! Each eligible candidate is scored as
//! `information(θ, b, a) × exposure_weight × breadth_bonus` and the highest
//! score wins. Ties go to the earliest candidate, so selection is
//! reproducible for a given pool order.

use serde::{Deserialize, Serialize};

use crate::config::SelectionParams;
use crate::irt::information;
use crate::model::{Item, Session};

/// Name of the only selection strategy, reported in rationales.
pub const MAXIMUM_INFORMATION: &str = "maximum_information";

/// Why an item was chosen. Output only; never feeds back into scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRationale {
    pub target_ability: f64,
    pub chosen_difficulty: f64,
    pub expected_information: f64,
    pub strategy: String,
}

/// An item chosen for administration.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub item: &'a Item,
    pub score: f64,
    pub rationale: SelectionRationale,
}

/// Exposure weight of an item within this session.
///
/// Used items are excluded outright. There is no decay across sessions.
pub fn exposure_weight(session: &Session, item: &Item) -> f64 {
    if session.is_used(&item.id) {
        0.0
    } else {
        1.0
    }
}

/// Coverage bonus for items on under-tested knowledge points.
pub fn breadth_bonus(session: &Session, item: &Item, params: &SelectionParams) -> f64 {
    if session.responses_for(&item.knowledge_point_id) < params.breadth_threshold {
        params.breadth_bonus
    } else {
        1.0
    }
}

/// Pick the next item from `pool`, or `None` if nothing is eligible.
///
/// Items that fail [`Item::validate`] are never eligible. `None` means the
/// pool is exhausted for this session; it is a normal termination signal,
/// not an error.
pub fn select_next<'a, I>(session: &Session, pool: I, params: &SelectionParams) -> Option<Selection<'a>>
where
    I: IntoIterator<Item = &'a Item>,
{
    let theta = session.ability().theta;
    let mut best: Option<(&'a Item, f64, f64)> = None;

    for item in pool {
        let exposure = exposure_weight(session, item);
        if exposure == 0.0 {
            continue;
        }
        if let Err(e) = item.validate() {
            tracing::warn!(item = %item.id, "skipping ineligible item: {e}");
            continue;
        }
        let info = information(theta, item.difficulty, item.discrimination).into_logged();
        let score = info * exposure * breadth_bonus(session, item, params);
        match best {
            Some((_, best_score, _)) if score <= best_score => {}
            _ => best = Some((item, score, info)),
        }
    }

    let (item, score, info) = best?;
    tracing::debug!(
        item = %item.id,
        difficulty = item.difficulty,
        theta,
        score,
        "selected item"
    );
    Some(Selection {
        item,
        score,
        rationale: SelectionRationale {
            target_ability: theta,
            chosen_difficulty: item.difficulty,
            expected_information: info,
            strategy: MAXIMUM_INFORMATION.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::model::{AbilityEstimate, Response};

    fn session_with(answered: &[(&str, &str)]) -> Session {
        let mut session = Session::new(SessionConfig::default()).unwrap();
        for (item, kp) in answered {
            session.record(
                Response {
                    item_id: item.to_string(),
                    knowledge_point_id: kp.to_string(),
                    is_correct: true,
                    difficulty_at_time: 0.0,
                    time_spent_seconds: None,
                    timestamp: chrono::Utc::now(),
                },
                AbilityEstimate::default(),
            );
        }
        session
    }

    #[test]
    fn picks_item_closest_to_ability() {
        let session = session_with(&[]);
        let pool = vec![
            Item::new("far", 2.5, "kp"),
            Item::new("near", 0.1, "kp"),
            Item::new("mid", -1.0, "kp"),
        ];
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "near");
        assert_eq!(chosen.rationale.strategy, "maximum_information");
        assert_eq!(chosen.rationale.chosen_difficulty, 0.1);
        assert_eq!(chosen.rationale.target_ability, 0.0);
    }

    #[test]
    fn malformed_items_are_skipped() {
        let session = session_with(&[]);
        let pool = vec![
            Item::new("bad", 0.0, "kp").with_discrimination(-1.5),
            Item::new("nan", f64::NAN, "kp"),
            Item::new("ok", 1.0, "kp"),
        ];
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "ok");

        let only_bad = vec![Item::new("bad", 0.0, "kp").with_discrimination(-1.5)];
        assert!(select_next(&session, &only_bad, &SelectionParams::default()).is_none());
    }

    #[test]
    fn used_items_are_never_selected() {
        let session = session_with(&[("a", "kp"), ("b", "kp")]);
        let pool = vec![
            Item::new("a", 0.0, "kp"),
            Item::new("b", 0.0, "kp"),
            Item::new("c", 2.9, "kp"),
        ];
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "c");
    }

    #[test]
    fn remaining_item_is_returned_even_with_zero_information() {
        let session = session_with(&[("a", "kp"), ("b", "kp")]);
        let pool = vec![
            Item::new("a", 0.0, "kp"),
            Item::new("b", 0.0, "kp"),
            Item::new("c", 900.0, "kp"),
        ];
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "c");
        assert_eq!(chosen.score, 0.0);
    }

    #[test]
    fn exhausted_pool_returns_none() {
        let session = session_with(&[("a", "kp")]);
        let pool = vec![Item::new("a", 0.0, "kp")];
        assert!(select_next(&session, &pool, &SelectionParams::default()).is_none());
        let empty: Vec<Item> = Vec::new();
        assert!(select_next(&session, &empty, &SelectionParams::default()).is_none());
    }

    #[test]
    fn ties_go_to_earliest_candidate() {
        let session = session_with(&[]);
        let pool = vec![
            Item::new("first", 0.5, "kp"),
            Item::new("second", -0.5, "kp"),
            Item::new("third", 0.5, "kp"),
        ];
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "first");
    }

    #[test]
    fn breadth_bonus_favours_under_tested_knowledge_points() {
        let session = session_with(&[("x1", "covered"), ("x2", "covered")]);
        let pool = vec![
            Item::new("on-covered", 0.0, "covered"),
            Item::new("on-fresh", 1.0, "fresh"),
        ];
        // 0.25 vs 2.0 * 0.1966
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "on-fresh");

        let no_bonus = SelectionParams {
            breadth_bonus: 1.0,
            ..Default::default()
        };
        let chosen = select_next(&session, &pool, &no_bonus).unwrap();
        assert_eq!(chosen.item.id, "on-covered");
    }

    #[test]
    fn higher_discrimination_wins_at_equal_distance() {
        let session = session_with(&[]);
        let pool = vec![
            Item::new("flat", 0.3, "kp").with_discrimination(0.5),
            Item::new("sharp", 0.3, "kp").with_discrimination(1.8),
        ];
        let chosen = select_next(&session, &pool, &SelectionParams::default()).unwrap();
        assert_eq!(chosen.item.id, "sharp");
        assert!(chosen.rationale.expected_information > 0.5);
    }
}
