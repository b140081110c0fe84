use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Campaigns ──────────────────────────────────────────────────────────

/// Advertising platform a campaign runs on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Meta,
    Google,
    Linkedin,
    Tiktok,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Meta => "meta",
            Platform::Google => "google",
            Platform::Linkedin => "linkedin",
            Platform::Tiktok => "tiktok",
        }
    }

    /// Human-readable name used in generated copy.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Meta => "Meta Ads",
            Platform::Google => "Google Ads",
            Platform::Linkedin => "LinkedIn Ads",
            Platform::Tiktok => "TikTok Ads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Ended,
}

/// A campaign record as delivered by an ad-platform sync. Read-only here.
///
/// `roas` is on the percentage scale used by the analytics tier (300 means
/// three times spend). It is not the revenue ratio carried by
/// [`MetricsSnapshot::roas`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub status: CampaignStatus,
    pub budget: f64,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub ctr: f64,
    pub cpa: f64,
    pub roas: f64,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Normalized metrics ─────────────────────────────────────────────────

/// Meta delivery diagnostics bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    AboveAverage,
    #[default]
    Average,
    BelowAverage,
}

impl Ranking {
    /// Parse the labels Meta returns, e.g. `BELOW_AVERAGE_35` or
    /// `ABOVE_AVERAGE`. Unknown labels are treated as average.
    pub fn from_meta_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.starts_with("below_average") {
            Ranking::BelowAverage
        } else if label.starts_with("above_average") {
            Ranking::AboveAverage
        } else {
            Ranking::Average
        }
    }
}

/// Google Ads specific metrics. Shares and rates are percentages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleMetrics {
    pub quality_score: f64,
    pub impression_share: f64,
    pub search_impression_share: f64,
    pub top_of_page_rate: f64,
    pub absolute_top_rate: f64,
    pub avg_position: f64,
    #[serde(rename = "budgetLostIS")]
    pub budget_lost_is: f64,
    #[serde(rename = "rankLostIS")]
    pub rank_lost_is: f64,
}

/// Meta Ads specific metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaMetrics {
    pub reach: u64,
    pub frequency: f64,
    pub cpm: f64,
    pub engagement_rate: f64,
    pub video_views: u64,
    pub video_completion_rate: f64,
    pub quality_ranking: Ranking,
    pub engagement_ranking: Ranking,
    pub conversion_ranking: Ranking,
}

/// Platform-specific extension of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum PlatformExtension {
    Google(GoogleMetrics),
    Meta(MetaMetrics),
}

/// Point-in-time normalized performance record for one campaign.
///
/// `ctr` and `conversion_rate` are percentages; `roas` is
/// `conversion_value / cost`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSnapshot {
    pub campaign_id: String,
    pub campaign_name: String,
    pub date: Option<NaiveDate>,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub cost: f64,
    pub conversions: f64,
    pub conversion_rate: f64,
    pub cpa: f64,
    pub roas: f64,
    pub conversion_value: f64,
    pub extension: Option<PlatformExtension>,
}

impl MetricsSnapshot {
    pub fn google(&self) -> Option<&GoogleMetrics> {
        match &self.extension {
            Some(PlatformExtension::Google(g)) => Some(g),
            _ => None,
        }
    }

    pub fn meta(&self) -> Option<&MetaMetrics> {
        match &self.extension {
            Some(PlatformExtension::Meta(m)) => Some(m),
            _ => None,
        }
    }

    /// Platform the snapshot was normalized from, if it carries an extension.
    pub fn platform(&self) -> Option<Platform> {
        match &self.extension {
            Some(PlatformExtension::Google(_)) => Some(Platform::Google),
            Some(PlatformExtension::Meta(_)) => Some(Platform::Meta),
            None => None,
        }
    }

    pub fn cost_per_click(&self) -> f64 {
        if self.clicks > 0 {
            self.cost / self.clicks as f64
        } else {
            0.0
        }
    }
}

// ─── Insight engine input ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub objective: String,
    /// Daily budget.
    pub budget: f64,
    #[serde(default)]
    pub bid_strategy: String,
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSetMeta {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdMeta {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeframe {
    pub current: MetricsSnapshot,
    #[serde(default)]
    pub previous: MetricsSnapshot,
    #[serde(default)]
    pub baseline: MetricsSnapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Benchmarks {
    pub industry: MetricsSnapshot,
    pub account: MetricsSnapshot,
    pub top_performing: MetricsSnapshot,
}

/// Everything the insight engine needs to evaluate one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightContext {
    pub campaign: CampaignMeta,
    #[serde(default)]
    pub ad_set: Option<AdSetMeta>,
    #[serde(default)]
    pub ad: Option<AdMeta>,
    pub timeframe: Timeframe,
    #[serde(default)]
    pub benchmarks: Benchmarks,
}

// ─── Insights ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Opportunity,
}

impl Severity {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Opportunity => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of insights the engine can emit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    CtrDecline,
    ConversionRateDecline,
    RoasBelowTarget,
    BudgetExhaustion,
    BudgetUnderutilization,
    BidOptimization,
    AdFatigue,
    AudienceExpansion,
    QualityScoreDrop,
    ImpressionShareLoss,
    BudgetLimitedImpressionShare,
    RankLimitedImpressionShare,
    QualityRankingLow,
    VideoCompletionLow,
    CpaIncrease,
    ConversionRateLow,
    ScalingOpportunity,
    CpmSpike,
    PlatformArbitrage,
}

impl InsightType {
    pub const ALL: [InsightType; 19] = [
        InsightType::CtrDecline,
        InsightType::ConversionRateDecline,
        InsightType::RoasBelowTarget,
        InsightType::BudgetExhaustion,
        InsightType::BudgetUnderutilization,
        InsightType::BidOptimization,
        InsightType::AdFatigue,
        InsightType::AudienceExpansion,
        InsightType::QualityScoreDrop,
        InsightType::ImpressionShareLoss,
        InsightType::BudgetLimitedImpressionShare,
        InsightType::RankLimitedImpressionShare,
        InsightType::QualityRankingLow,
        InsightType::VideoCompletionLow,
        InsightType::CpaIncrease,
        InsightType::ConversionRateLow,
        InsightType::ScalingOpportunity,
        InsightType::CpmSpike,
        InsightType::PlatformArbitrage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::CtrDecline => "ctr_decline",
            InsightType::ConversionRateDecline => "conversion_rate_decline",
            InsightType::RoasBelowTarget => "roas_below_target",
            InsightType::BudgetExhaustion => "budget_exhaustion",
            InsightType::BudgetUnderutilization => "budget_underutilization",
            InsightType::BidOptimization => "bid_optimization",
            InsightType::AdFatigue => "ad_fatigue",
            InsightType::AudienceExpansion => "audience_expansion",
            InsightType::QualityScoreDrop => "quality_score_drop",
            InsightType::ImpressionShareLoss => "impression_share_loss",
            InsightType::BudgetLimitedImpressionShare => "budget_limited_impression_share",
            InsightType::RankLimitedImpressionShare => "rank_limited_impression_share",
            InsightType::QualityRankingLow => "quality_ranking_low",
            InsightType::VideoCompletionLow => "video_completion_low",
            InsightType::CpaIncrease => "cpa_increase",
            InsightType::ConversionRateLow => "conversion_rate_low",
            InsightType::ScalingOpportunity => "scaling_opportunity",
            InsightType::CpmSpike => "cpm_spike",
            InsightType::PlatformArbitrage => "platform_arbitrage",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InsightPlatform {
    Meta,
    Google,
    CrossPlatform,
}

impl From<Platform> for InsightPlatform {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Meta => InsightPlatform::Meta,
            Platform::Google => InsightPlatform::Google,
            Platform::Linkedin | Platform::Tiktok => InsightPlatform::CrossPlatform,
        }
    }
}

/// One ranked, human-readable finding produced by the insight engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdInsight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    /// Display text, e.g. `"$900 in additional revenue"`.
    pub estimated_impact: String,
    /// The dollar figure embedded in `estimated_impact`.
    pub estimated_impact_usd: f64,
    /// 0-100.
    pub confidence: u8,
    pub data_points: Vec<String>,
    pub platform: InsightPlatform,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub ad_set_id: Option<String>,
    #[serde(default)]
    pub ad_id: Option<String>,
    pub timeframe: String,
    pub actionable: bool,
    pub automation_possible: bool,
}

// ─── Analytics tier ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceInsightKind {
    AdFatigue,
    BudgetOptimization,
    PerformanceAlert,
    PlatformComparison,
}

/// Coarse campaign-level insight produced by the analytics tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInsight {
    pub id: String,
    pub kind: PerformanceInsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub campaign_ids: Vec<String>,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub impact: Option<String>,
    pub created_at: DateTime<Utc>,
}
