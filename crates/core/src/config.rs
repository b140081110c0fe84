use crate::error::{MiaError, MiaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `MIA__`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rules: InsightRules,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Thresholds evaluated by the insight engine. Percentages are expressed on
/// the 0-100 scale, money in account currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRules {
    #[serde(default = "default_critical_ctr_drop_pct")]
    pub critical_ctr_drop_pct: f64,
    #[serde(default = "default_conversion_rate_drop_pct")]
    pub conversion_rate_drop_pct: f64,
    #[serde(default = "default_roas_target")]
    pub roas_target: f64,
    #[serde(default = "default_quality_score_floor")]
    pub quality_score_floor: f64,
    #[serde(default = "default_frequency_ceiling")]
    pub frequency_ceiling: f64,
    #[serde(default = "default_conversion_rate_floor")]
    pub conversion_rate_floor: f64,
    #[serde(default = "default_cost_increase_alert_pct")]
    pub cost_increase_alert_pct: f64,
    #[serde(default = "default_impression_share_floor")]
    pub impression_share_floor: f64,
    /// Budget-lost or rank-lost impression share above which Google
    /// campaigns are flagged.
    #[serde(default = "default_lost_impression_share_alert_pct")]
    pub lost_impression_share_alert_pct: f64,
    #[serde(default = "default_video_completion_floor")]
    pub video_completion_floor: f64,
    /// How far current CPA may exceed the industry CPA before bids are flagged.
    #[serde(default = "default_cpa_premium_pct")]
    pub cpa_premium_pct: f64,
    /// How far current CTR must exceed the account CTR to flag an audience
    /// expansion opportunity.
    #[serde(default = "default_audience_ctr_lift_pct")]
    pub audience_ctr_lift_pct: f64,
    #[serde(default = "default_budget_exhaustion_pct")]
    pub budget_exhaustion_pct: f64,
    #[serde(default = "default_budget_underutilization_pct")]
    pub budget_underutilization_pct: f64,
    #[serde(default = "default_platform_arbitrage_ratio")]
    pub platform_arbitrage_ratio: f64,
    /// Length of the "current" window in days; spend is divided by this to
    /// get daily spend.
    #[serde(default = "default_short_term_days")]
    pub short_term_days: u32,
    #[serde(default = "default_minimum_spend")]
    pub minimum_spend: f64,
    #[serde(default = "default_minimum_conversions")]
    pub minimum_conversions: f64,
    #[serde(default = "default_minimum_impressions")]
    pub minimum_impressions: u64,
}

/// Thresholds for the campaign-level analytics tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_fatigue_ctr")]
    pub fatigue_ctr: f64,
    #[serde(default = "default_fatigue_impressions")]
    pub fatigue_impressions: u64,
    #[serde(default = "default_scale_roas")]
    pub scale_roas: f64,
    #[serde(default = "default_reduce_roas")]
    pub reduce_roas: f64,
    #[serde(default = "default_target_conversion_index")]
    pub target_conversion_index: f64,
    #[serde(default = "default_platform_gap_ratio")]
    pub platform_gap_ratio: f64,
}

// Default functions
fn default_critical_ctr_drop_pct() -> f64 {
    30.0
}
fn default_conversion_rate_drop_pct() -> f64 {
    20.0
}
fn default_roas_target() -> f64 {
    3.0
}
fn default_quality_score_floor() -> f64 {
    5.0
}
fn default_frequency_ceiling() -> f64 {
    3.5
}
fn default_conversion_rate_floor() -> f64 {
    1.0
}
fn default_cost_increase_alert_pct() -> f64 {
    25.0
}
fn default_impression_share_floor() -> f64 {
    70.0
}
fn default_lost_impression_share_alert_pct() -> f64 {
    20.0
}
fn default_video_completion_floor() -> f64 {
    25.0
}
fn default_cpa_premium_pct() -> f64 {
    50.0
}
fn default_audience_ctr_lift_pct() -> f64 {
    50.0
}
fn default_budget_exhaustion_pct() -> f64 {
    95.0
}
fn default_budget_underutilization_pct() -> f64 {
    50.0
}
fn default_platform_arbitrage_ratio() -> f64 {
    1.5
}
fn default_short_term_days() -> u32 {
    7
}
fn default_minimum_spend() -> f64 {
    100.0
}
fn default_minimum_conversions() -> f64 {
    5.0
}
fn default_minimum_impressions() -> u64 {
    1000
}

fn default_fatigue_ctr() -> f64 {
    1.0
}
fn default_fatigue_impressions() -> u64 {
    10_000
}
fn default_scale_roas() -> f64 {
    300.0
}
fn default_reduce_roas() -> f64 {
    100.0
}
fn default_target_conversion_index() -> f64 {
    150.0
}
fn default_platform_gap_ratio() -> f64 {
    1.5
}

impl Default for InsightRules {
    fn default() -> Self {
        Self {
            critical_ctr_drop_pct: default_critical_ctr_drop_pct(),
            conversion_rate_drop_pct: default_conversion_rate_drop_pct(),
            roas_target: default_roas_target(),
            quality_score_floor: default_quality_score_floor(),
            frequency_ceiling: default_frequency_ceiling(),
            conversion_rate_floor: default_conversion_rate_floor(),
            cost_increase_alert_pct: default_cost_increase_alert_pct(),
            impression_share_floor: default_impression_share_floor(),
            lost_impression_share_alert_pct: default_lost_impression_share_alert_pct(),
            video_completion_floor: default_video_completion_floor(),
            cpa_premium_pct: default_cpa_premium_pct(),
            audience_ctr_lift_pct: default_audience_ctr_lift_pct(),
            budget_exhaustion_pct: default_budget_exhaustion_pct(),
            budget_underutilization_pct: default_budget_underutilization_pct(),
            platform_arbitrage_ratio: default_platform_arbitrage_ratio(),
            short_term_days: default_short_term_days(),
            minimum_spend: default_minimum_spend(),
            minimum_conversions: default_minimum_conversions(),
            minimum_impressions: default_minimum_impressions(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            fatigue_ctr: default_fatigue_ctr(),
            fatigue_impressions: default_fatigue_impressions(),
            scale_roas: default_scale_roas(),
            reduce_roas: default_reduce_roas(),
            target_conversion_index: default_target_conversion_index(),
            platform_gap_ratio: default_platform_gap_ratio(),
        }
    }
}

impl InsightRules {
    /// Reject threshold sets the engine cannot evaluate meaningfully.
    pub fn validate(&self) -> MiaResult<()> {
        if self.short_term_days == 0 {
            return Err(MiaError::Validation(
                "short_term_days must be at least 1".to_string(),
            ));
        }

        let named = [
            ("critical_ctr_drop_pct", self.critical_ctr_drop_pct),
            ("conversion_rate_drop_pct", self.conversion_rate_drop_pct),
            ("roas_target", self.roas_target),
            ("quality_score_floor", self.quality_score_floor),
            ("frequency_ceiling", self.frequency_ceiling),
            ("conversion_rate_floor", self.conversion_rate_floor),
            ("cost_increase_alert_pct", self.cost_increase_alert_pct),
            ("impression_share_floor", self.impression_share_floor),
            (
                "lost_impression_share_alert_pct",
                self.lost_impression_share_alert_pct,
            ),
            ("video_completion_floor", self.video_completion_floor),
            ("cpa_premium_pct", self.cpa_premium_pct),
            ("audience_ctr_lift_pct", self.audience_ctr_lift_pct),
            ("budget_exhaustion_pct", self.budget_exhaustion_pct),
            ("budget_underutilization_pct", self.budget_underutilization_pct),
            ("platform_arbitrage_ratio", self.platform_arbitrage_ratio),
            ("minimum_spend", self.minimum_spend),
            ("minimum_conversions", self.minimum_conversions),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(MiaError::Validation(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.budget_underutilization_pct > self.budget_exhaustion_pct {
            return Err(MiaError::Validation(
                "budget_underutilization_pct must not exceed budget_exhaustion_pct".to_string(),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment
    /// variables (`MIA__RULES__ROAS_TARGET=2.5`).
    pub fn load(path: Option<&Path>) -> MiaResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MIA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.rules.validate()?;
        Ok(config)
    }
}
