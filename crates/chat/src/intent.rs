//! Substring-vocabulary intent classifier and entity extraction.

use mia_analytics::CampaignMetric;
use mia_core::types::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Performance,
    Optimization,
    Comparison,
    Trend,
    Budget,
    General,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Performance => "performance",
            QueryIntent::Optimization => "optimization",
            QueryIntent::Comparison => "comparison",
            QueryIntent::Trend => "trend",
            QueryIntent::Budget => "budget",
            QueryIntent::General => "general",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked in order; the first intent with a matching term wins.
const INTENT_VOCABULARY: [(QueryIntent, &[&str]); 5] = [
    (
        QueryIntent::Comparison,
        &["compare", "comparison", " vs", "versus", "better than", "difference between"],
    ),
    (
        QueryIntent::Trend,
        &["trend", "over time", "history", "growth", "trajectory", "day by day"],
    ),
    (
        QueryIntent::Budget,
        &["budget", "spend", "spending", "cost", "allocat", "money"],
    ),
    (
        QueryIntent::Optimization,
        &["optimiz", "optimis", "improve", "recommend", "suggest", "boost", "increase"],
    ),
    (
        QueryIntent::Performance,
        &[
            "perform",
            "how are",
            "how is",
            "doing",
            "results",
            "metrics",
            "ctr",
            "roas",
            "cpa",
            "conversion",
        ],
    ),
];

const PLATFORM_VOCABULARY: [(&str, Platform); 6] = [
    ("google", Platform::Google),
    ("meta", Platform::Meta),
    ("facebook", Platform::Meta),
    ("instagram", Platform::Meta),
    ("linkedin", Platform::Linkedin),
    ("tiktok", Platform::Tiktok),
];

const TIMEFRAME_VOCABULARY: [(&str, &str); 8] = [
    ("today", "today"),
    ("yesterday", "yesterday"),
    ("last 7 days", "last_7_days"),
    ("this week", "last_7_days"),
    ("last week", "last_7_days"),
    ("last 30 days", "last_30_days"),
    ("this month", "this_month"),
    ("last month", "last_month"),
];

// Longer phrases before the words they contain.
const METRIC_VOCABULARY: [(&str, CampaignMetric); 12] = [
    ("return on ad spend", CampaignMetric::Roas),
    ("roas", CampaignMetric::Roas),
    ("click-through", CampaignMetric::Ctr),
    ("click through", CampaignMetric::Ctr),
    ("ctr", CampaignMetric::Ctr),
    ("cost per acquisition", CampaignMetric::Cpa),
    ("cpa", CampaignMetric::Cpa),
    ("conversion", CampaignMetric::Conversions),
    ("click", CampaignMetric::Clicks),
    ("impression", CampaignMetric::Impressions),
    ("spend", CampaignMetric::Spend),
    ("budget", CampaignMetric::Budget),
];

/// Optional qualifiers pulled out of a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEntities {
    pub platform: Option<Platform>,
    pub timeframe: Option<String>,
    pub metric: Option<CampaignMetric>,
}

pub fn classify_intent(query: &str) -> QueryIntent {
    let q = query.to_lowercase();
    INTENT_VOCABULARY
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| q.contains(t)))
        .map(|(intent, _)| *intent)
        .unwrap_or(QueryIntent::General)
}

pub fn extract_entities(query: &str) -> QueryEntities {
    let q = query.to_lowercase();
    QueryEntities {
        platform: first_match(&q, &PLATFORM_VOCABULARY),
        timeframe: first_match(&q, &TIMEFRAME_VOCABULARY).map(str::to_string),
        metric: first_match(&q, &METRIC_VOCABULARY),
    }
}

fn first_match<T: Copy>(q: &str, vocabulary: &[(&str, T)]) -> Option<T> {
    vocabulary
        .iter()
        .find(|(term, _)| q.contains(term))
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_intent() {
        assert_eq!(classify_intent("How are my campaigns performing?"), QueryIntent::Performance);
        assert_eq!(classify_intent("How can I improve results?"), QueryIntent::Optimization);
        assert_eq!(classify_intent("Compare Google and Meta"), QueryIntent::Comparison);
        assert_eq!(classify_intent("Show me the CTR trend"), QueryIntent::Trend);
        assert_eq!(classify_intent("Where should my budget go?"), QueryIntent::Budget);
        assert_eq!(classify_intent("hello there"), QueryIntent::General);
    }

    #[test]
    fn test_precedence() {
        // comparison beats budget
        assert_eq!(classify_intent("Google vs Meta spend"), QueryIntent::Comparison);
        // trend beats performance
        assert_eq!(classify_intent("ROAS trend"), QueryIntent::Trend);
        // budget beats optimization
        assert_eq!(classify_intent("Increase budget?"), QueryIntent::Budget);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(classify_intent("COMPARE PLATFORMS"), QueryIntent::Comparison);
    }

    #[test]
    fn test_extract_entities() {
        let entities = extract_entities("What was my Facebook CPA last month?");
        assert_eq!(entities.platform, Some(Platform::Meta));
        assert_eq!(entities.metric, Some(CampaignMetric::Cpa));
        assert_eq!(entities.timeframe.as_deref(), Some("last_month"));
    }

    #[test]
    fn test_metric_prefers_longer_phrases() {
        let entities = extract_entities("click-through rate on google");
        assert_eq!(entities.metric, Some(CampaignMetric::Ctr));
        assert_eq!(entities.platform, Some(Platform::Google));
    }

    #[test]
    fn test_no_entities() {
        assert_eq!(extract_entities("hello"), QueryEntities::default());
    }
}
