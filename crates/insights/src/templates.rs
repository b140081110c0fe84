//! Static insight metadata and the priority scorer.

use mia_core::types::{AdInsight, InsightType, Severity};
use serde::Serialize;

/// Upper bound of [`calculate_insight_priority`].
pub const MAX_PRIORITY: f64 = 200.0;

const CONFIDENCE_WEIGHT: f64 = 20.0;
const ACTIONABLE_BONUS: f64 = 15.0;
const AUTOMATION_BONUS: f64 = 10.0;

// ─── Templates ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Performance,
    Budget,
    Bidding,
    Creative,
    Audience,
    Quality,
    Visibility,
    CrossPlatform,
}

/// Rule metadata shared by every insight of one type.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InsightTemplate {
    pub insight_type: InsightType,
    pub category: InsightCategory,
    pub title: &'static str,
    pub default_severity: Severity,
    pub actionable: bool,
    pub automation_possible: bool,
    pub data_points: &'static [&'static str],
}

/// Template for an insight type.
pub fn template(insight_type: InsightType) -> InsightTemplate {
    use InsightCategory::*;
    use InsightType::*;

    let (category, title, default_severity, automation_possible, data_points): (
        InsightCategory,
        &'static str,
        Severity,
        bool,
        &'static [&'static str],
    ) = match insight_type {
        CtrDecline => (
            Performance,
            "Click-Through Rate Declining",
            Severity::Critical,
            false,
            &["ctr", "impressions", "clicks"],
        ),
        ConversionRateDecline => (
            Performance,
            "Conversion Rate Dropping",
            Severity::High,
            false,
            &["conversionRate", "conversions", "clicks"],
        ),
        RoasBelowTarget => (
            Performance,
            "ROAS Below Target",
            Severity::High,
            true,
            &["roas", "cost", "conversionValue"],
        ),
        BudgetExhaustion => (
            Budget,
            "Budget Nearly Exhausted",
            Severity::High,
            false,
            &["cost", "budget"],
        ),
        BudgetUnderutilization => (
            Budget,
            "Budget Underutilized",
            Severity::Medium,
            false,
            &["cost", "budget"],
        ),
        BidOptimization => (
            Bidding,
            "CPA Above Industry Benchmark",
            Severity::High,
            true,
            &["cpa", "industryCpa"],
        ),
        AdFatigue => (
            Creative,
            "Ad Fatigue Detected",
            Severity::Medium,
            false,
            &["frequency", "reach", "ctr"],
        ),
        AudienceExpansion => (
            Audience,
            "Audience Expansion Opportunity",
            Severity::Opportunity,
            true,
            &["ctr", "accountCtr"],
        ),
        QualityScoreDrop => (
            Quality,
            "Low Quality Score",
            Severity::High,
            false,
            &["qualityScore", "cost"],
        ),
        ImpressionShareLoss => (
            Visibility,
            "Losing Impression Share",
            Severity::Medium,
            true,
            &["impressionShare", "searchImpressionShare"],
        ),
        BudgetLimitedImpressionShare => (
            Visibility,
            "Impressions Lost to Budget",
            Severity::Medium,
            true,
            &["budgetLostIS", "impressionShare"],
        ),
        RankLimitedImpressionShare => (
            Visibility,
            "Impressions Lost to Ad Rank",
            Severity::Medium,
            false,
            &["rankLostIS", "qualityScore"],
        ),
        QualityRankingLow => (
            Quality,
            "Below-Average Quality Ranking",
            Severity::High,
            false,
            &["qualityRanking", "cpm"],
        ),
        VideoCompletionLow => (
            Creative,
            "Low Video Completion Rate",
            Severity::Medium,
            false,
            &["videoCompletionRate", "videoViews"],
        ),
        CpaIncrease => (
            Bidding,
            "Cost per Acquisition Rising",
            Severity::High,
            true,
            &["cpa", "previousCpa", "conversions"],
        ),
        ConversionRateLow => (
            Performance,
            "Conversion Rate Below Floor",
            Severity::Medium,
            false,
            &["conversionRate", "clicks"],
        ),
        ScalingOpportunity => (
            Budget,
            "Scale a Top Performer",
            Severity::Opportunity,
            true,
            &["roas", "topPerformingRoas", "cost"],
        ),
        CpmSpike => (
            Bidding,
            "CPM Increasing",
            Severity::Medium,
            false,
            &["cpm", "previousCpm", "impressions"],
        ),
        PlatformArbitrage => (
            CrossPlatform,
            "Cross-Platform Budget Arbitrage",
            Severity::Opportunity,
            true,
            &["roas", "cost", "platform"],
        ),
    };

    InsightTemplate {
        insight_type,
        category,
        title,
        default_severity,
        actionable: true,
        automation_possible,
        data_points,
    }
}

// ─── Priority ───────────────────────────────────────────────────────────

pub fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 100.0,
        Severity::High => 80.0,
        Severity::Medium => 60.0,
        Severity::Low => 40.0,
        Severity::Opportunity => 30.0,
    }
}

/// Tiered bonus for the estimated dollar impact.
pub fn impact_bonus(impact_usd: f64) -> f64 {
    if !impact_usd.is_finite() {
        return 0.0;
    }
    if impact_usd > 1000.0 {
        25.0
    } else if impact_usd > 500.0 {
        15.0
    } else if impact_usd > 100.0 {
        10.0
    } else if impact_usd > 50.0 {
        5.0
    } else {
        0.0
    }
}

/// Deterministic priority in `[0, 200]`.
pub fn calculate_insight_priority(insight: &AdInsight) -> f64 {
    let confidence = f64::from(insight.confidence.min(100));

    let mut score = severity_weight(insight.severity);
    score += confidence / 100.0 * CONFIDENCE_WEIGHT;
    if insight.actionable {
        score += ACTIONABLE_BONUS;
    }
    if insight.automation_possible {
        score += AUTOMATION_BONUS;
    }
    score += impact_bonus(insight.estimated_impact_usd);

    score.clamp(0.0, MAX_PRIORITY)
}

/// An insight paired with its priority.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredInsight {
    #[serde(flatten)]
    pub insight: AdInsight,
    pub priority: f64,
}

/// Score and order insights, highest priority first. Ties keep input order.
pub fn rank_by_priority(insights: Vec<AdInsight>) -> Vec<ScoredInsight> {
    let mut scored: Vec<ScoredInsight> = insights
        .into_iter()
        .map(|insight| ScoredInsight {
            priority: calculate_insight_priority(&insight),
            insight,
        })
        .collect();
    scored.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    scored
}
