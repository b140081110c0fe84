//! Campaign aggregation and the coarse insight tier.

use crate::query::{CampaignFilter, CampaignMetric, TrendPoint};
use chrono::{Days, NaiveDate, Utc};
use mia_core::config::AnalyticsConfig;
use mia_core::types::{Campaign, PerformanceInsight, PerformanceInsightKind, Platform, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-platform totals.
///
/// `conversion_index` is conversions per 100 currency units spent. It is
/// not a revenue ratio and must not be compared with snapshot ROAS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    pub platform: Platform,
    pub campaign_count: usize,
    pub total_spend: f64,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub average_ctr: f64,
    pub average_cpa: f64,
    pub conversion_index: f64,
}

pub struct AnalyticsService {
    config: AnalyticsConfig,
}

impl AnalyticsService {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Group campaigns by platform, in platform order.
    pub fn calculate_platform_metrics(&self, campaigns: &[Campaign]) -> Vec<PlatformMetrics> {
        let mut groups: BTreeMap<Platform, Vec<&Campaign>> = BTreeMap::new();
        for campaign in campaigns {
            groups.entry(campaign.platform).or_default().push(campaign);
        }

        groups
            .into_iter()
            .map(|(platform, group)| {
                let total_spend: f64 = group.iter().map(|c| c.spend).sum();
                let total_impressions: u64 = group.iter().map(|c| c.impressions).sum();
                let total_clicks: u64 = group.iter().map(|c| c.clicks).sum();
                let total_conversions: u64 = group.iter().map(|c| c.conversions).sum();
                let count = group.len();

                PlatformMetrics {
                    platform,
                    campaign_count: count,
                    total_spend,
                    total_impressions,
                    total_clicks,
                    total_conversions,
                    average_ctr: group.iter().map(|c| c.ctr).sum::<f64>() / count as f64,
                    average_cpa: if total_conversions > 0 {
                        total_spend / total_conversions as f64
                    } else {
                        0.0
                    },
                    conversion_index: if total_spend > 0.0 {
                        total_conversions as f64 * 100.0 / total_spend
                    } else {
                        0.0
                    },
                }
            })
            .collect()
    }

    /// Fatigue, budget, performance and platform-gap insights, most urgent
    /// first.
    pub fn generate_insights(&self, campaigns: &[Campaign]) -> Vec<PerformanceInsight> {
        let platforms = self.calculate_platform_metrics(campaigns);

        let mut insights = self.ad_fatigue_insights(campaigns);
        insights.extend(self.budget_insights(campaigns));
        insights.extend(self.performance_insights(&platforms));
        insights.extend(self.platform_comparison(campaigns, &platforms));
        insights.sort_by_key(|i| i.severity.rank());

        debug!(
            campaigns = campaigns.len(),
            platforms = platforms.len(),
            insights = insights.len(),
            "Generated campaign performance insights"
        );
        insights
    }

    pub fn filter_campaigns<'a>(
        &self,
        campaigns: &'a [Campaign],
        filter: &CampaignFilter,
    ) -> Vec<&'a Campaign> {
        campaigns.iter().filter(|c| filter.matches(c)).collect()
    }

    /// Highest non-zero values first.
    pub fn get_top_performers<'a>(
        &self,
        campaigns: &'a [Campaign],
        metric: CampaignMetric,
        limit: usize,
    ) -> Vec<&'a Campaign> {
        let mut ranked: Vec<&Campaign> = campaigns
            .iter()
            .filter(|c| metric.value(c) > 0.0)
            .collect();
        ranked.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));
        ranked.truncate(limit);
        ranked
    }

    /// Lowest values first, zeros included.
    pub fn get_worst_performers<'a>(
        &self,
        campaigns: &'a [Campaign],
        metric: CampaignMetric,
        limit: usize,
    ) -> Vec<&'a Campaign> {
        let mut ranked: Vec<&Campaign> = campaigns.iter().collect();
        ranked.sort_by(|a, b| metric.value(a).total_cmp(&metric.value(b)));
        ranked.truncate(limit);
        ranked
    }

    /// Spread current totals evenly over `days` points ending at `end_date`.
    ///
    /// This is an interpolator, not a time series: campaigns carry no
    /// per-day history, so every point holds the same share of the totals.
    pub fn calculate_trends(
        &self,
        campaigns: &[Campaign],
        days: u32,
        end_date: NaiveDate,
    ) -> Vec<TrendPoint> {
        if days == 0 {
            return Vec::new();
        }

        let n = f64::from(days);
        let spend: f64 = campaigns.iter().map(|c| c.spend).sum();
        let impressions = campaigns.iter().map(|c| c.impressions).sum::<u64>() as f64;
        let clicks = campaigns.iter().map(|c| c.clicks).sum::<u64>() as f64;
        let conversions = campaigns.iter().map(|c| c.conversions).sum::<u64>() as f64;
        let ctr = if impressions > 0.0 {
            clicks / impressions * 100.0
        } else {
            0.0
        };
        let cpa = if conversions > 0.0 {
            spend / conversions
        } else {
            0.0
        };

        (0..days)
            .rev()
            .filter_map(|back| end_date.checked_sub_days(Days::new(u64::from(back))))
            .map(|date| TrendPoint {
                date,
                spend: spend / n,
                impressions: impressions / n,
                clicks: clicks / n,
                conversions: conversions / n,
                ctr,
                cpa,
            })
            .collect()
    }

    // ── insight rules ───────────────────────────────────────────────────

    fn ad_fatigue_insights(&self, campaigns: &[Campaign]) -> Vec<PerformanceInsight> {
        campaigns
            .iter()
            .filter(|c| {
                c.ctr < self.config.fatigue_ctr && c.impressions > self.config.fatigue_impressions
            })
            .map(|c| PerformanceInsight {
                id: format!("ad_fatigue_{}", c.id),
                kind: PerformanceInsightKind::AdFatigue,
                severity: Severity::Medium,
                title: format!("Ad fatigue on {}", c.name),
                description: format!(
                    "CTR is {:.2}% after {} impressions, below the {:.1}% fatigue line.",
                    c.ctr, c.impressions, self.config.fatigue_ctr
                ),
                recommendation: "Refresh creatives or rotate in new ad variations.".to_string(),
                campaign_ids: vec![c.id.clone()],
                platform: Some(c.platform),
                impact: Some("Potential CTR improvement of 20-30%".to_string()),
                created_at: Utc::now(),
            })
            .collect()
    }

    fn budget_insights(&self, campaigns: &[Campaign]) -> Vec<PerformanceInsight> {
        campaigns
            .iter()
            .filter_map(|c| {
                // Reducing needs spend; idle campaigns report 0 ROAS.
                if c.roas > self.config.scale_roas {
                    Some(PerformanceInsight {
                        id: format!("budget_scale_{}", c.id),
                        kind: PerformanceInsightKind::BudgetOptimization,
                        severity: Severity::Medium,
                        title: format!("Scale budget for {}", c.name),
                        description: format!(
                            "ROAS of {:.0}% is above the {:.0}% scaling line.",
                            c.roas, self.config.scale_roas
                        ),
                        recommendation: "Increase budget by 20-50% while monitoring returns."
                            .to_string(),
                        campaign_ids: vec![c.id.clone()],
                        platform: Some(c.platform),
                        impact: Some(format!(
                            "Up to ${:.0} in additional spend at current returns",
                            c.spend * 0.5
                        )),
                        created_at: Utc::now(),
                    })
                } else if c.roas < self.config.reduce_roas && c.spend > 0.0 {
                    Some(PerformanceInsight {
                        id: format!("budget_reduce_{}", c.id),
                        kind: PerformanceInsightKind::BudgetOptimization,
                        severity: Severity::High,
                        title: format!("Reduce spend on {}", c.name),
                        description: format!(
                            "ROAS of {:.0}% is below break-even on ${:.2} spend.",
                            c.roas, c.spend
                        ),
                        recommendation: "Cut budget or pause while creatives are reworked."
                            .to_string(),
                        campaign_ids: vec![c.id.clone()],
                        platform: Some(c.platform),
                        impact: Some(format!("Save up to ${:.0}", c.spend * 0.3)),
                        created_at: Utc::now(),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    fn performance_insights(&self, platforms: &[PlatformMetrics]) -> Vec<PerformanceInsight> {
        platforms
            .iter()
            // A platform with no spend has no conversion index to judge.
            .filter(|p| {
                p.total_spend > 0.0 && p.conversion_index < self.config.target_conversion_index
            })
            .map(|p| PerformanceInsight {
                id: format!("performance_{}", p.platform),
                kind: PerformanceInsightKind::PerformanceAlert,
                severity: Severity::Medium,
                title: format!("{} below conversion target", p.platform.display_name()),
                description: format!(
                    "{} campaigns deliver {:.1} conversions per $100 against a target of {:.1}.",
                    p.campaign_count, p.conversion_index, self.config.target_conversion_index
                ),
                recommendation: "Review targeting, bids and landing pages across these campaigns."
                    .to_string(),
                campaign_ids: Vec::new(),
                platform: Some(p.platform),
                impact: None,
                created_at: Utc::now(),
            })
            .collect()
    }

    fn platform_comparison(
        &self,
        campaigns: &[Campaign],
        platforms: &[PlatformMetrics],
    ) -> Option<PerformanceInsight> {
        let scored: Vec<&PlatformMetrics> = platforms
            .iter()
            .filter(|p| p.conversion_index > 0.0)
            .collect();
        if scored.len() < 2 {
            return None;
        }

        let best = scored
            .iter()
            .max_by(|a, b| a.conversion_index.total_cmp(&b.conversion_index))?;
        let worst = scored
            .iter()
            .min_by(|a, b| a.conversion_index.total_cmp(&b.conversion_index))?;
        let gap = best.conversion_index / worst.conversion_index;
        if gap <= self.config.platform_gap_ratio {
            return None;
        }

        Some(PerformanceInsight {
            id: format!("platform_gap_{}_{}", best.platform, worst.platform),
            kind: PerformanceInsightKind::PlatformComparison,
            severity: Severity::Medium,
            title: format!(
                "{} outperforms {}",
                best.platform.display_name(),
                worst.platform.display_name()
            ),
            description: format!(
                "{} converts {:.1}x better per dollar than {}.",
                best.platform.display_name(),
                gap,
                worst.platform.display_name()
            ),
            recommendation: format!(
                "Shift budget from {} toward {}.",
                worst.platform.display_name(),
                best.platform.display_name()
            ),
            campaign_ids: campaigns
                .iter()
                .filter(|c| c.platform == best.platform || c.platform == worst.platform)
                .map(|c| c.id.clone())
                .collect(),
            platform: Some(best.platform),
            impact: None,
            created_at: Utc::now(),
        })
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}
