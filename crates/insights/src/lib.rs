//! Insight generation: heuristic rule evaluation over normalized campaign
//! metrics, insight templates, and priority scoring.

pub mod engine;
pub mod templates;

pub use engine::InsightEngine;
pub use templates::{calculate_insight_priority, rank_by_priority, template, ScoredInsight};
