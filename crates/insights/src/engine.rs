//! Rule engine turning an [`InsightContext`] into ranked [`AdInsight`]s.
//!
//! Every rule is evaluated independently and emits at most one insight.
//! Contexts whose current window does not meet the minimum spend and
//! impression volume produce no insights at all.

use crate::templates::template;
use mia_core::config::InsightRules;
use mia_core::error::MiaResult;
use mia_core::types::{
    AdInsight, GoogleMetrics, InsightContext, InsightPlatform, InsightType, MetaMetrics,
    MetricsSnapshot, Platform, PlatformExtension, Ranking, Severity,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

type RuleFn = fn(&InsightEngine, &InsightContext) -> Option<AdInsight>;

/// Rule output before template metadata and scope are attached.
struct Finding {
    insight_type: InsightType,
    severity: Severity,
    confidence: u8,
    description: String,
    recommendation: String,
    impact_usd: f64,
    impact_label: &'static str,
}

/// Who an insight is about.
struct Scope {
    /// Campaign id, then ad set and ad ids when present.
    key: String,
    platform: InsightPlatform,
    campaign_id: Option<String>,
    ad_set_id: Option<String>,
    ad_id: Option<String>,
}

impl Scope {
    fn of(context: &InsightContext) -> Self {
        let mut key = context.campaign.id.clone();
        for id in [
            context.ad_set.as_ref().map(|a| a.id.as_str()),
            context.ad.as_ref().map(|a| a.id.as_str()),
        ]
        .into_iter()
        .flatten()
        {
            key.push('_');
            key.push_str(id);
        }

        Self {
            key,
            platform: context
                .timeframe
                .current
                .platform()
                .map(InsightPlatform::from)
                .unwrap_or(InsightPlatform::CrossPlatform),
            campaign_id: Some(context.campaign.id.clone()),
            ad_set_id: context.ad_set.as_ref().map(|a| a.id.clone()),
            ad_id: context.ad.as_ref().map(|a| a.id.clone()),
        }
    }

    fn portfolio() -> Self {
        Self {
            key: "portfolio".to_string(),
            platform: InsightPlatform::CrossPlatform,
            campaign_id: None,
            ad_set_id: None,
            ad_id: None,
        }
    }
}

/// Heuristic insight generator. Thresholds come from [`InsightRules`].
pub struct InsightEngine {
    rules: InsightRules,
}

impl InsightEngine {
    pub fn new(rules: InsightRules) -> Self {
        Self { rules }
    }

    /// Construct after validating the rule set.
    pub fn try_new(rules: InsightRules) -> MiaResult<Self> {
        rules.validate()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &InsightRules {
        &self.rules
    }

    /// Whether a window carries enough spend and volume to be judged.
    pub fn has_sufficient_data(&self, current: &MetricsSnapshot) -> bool {
        current.cost >= self.rules.minimum_spend
            && current.impressions >= self.rules.minimum_impressions
    }

    /// Evaluate every rule against one campaign, most urgent first.
    pub fn generate_insights(&self, context: &InsightContext) -> Vec<AdInsight> {
        let current = &context.timeframe.current;
        if !self.has_sufficient_data(current) {
            debug!(
                campaign_id = %context.campaign.id,
                cost = current.cost,
                impressions = current.impressions,
                "Insufficient data for insight generation"
            );
            metrics::counter!("insights.skipped_insufficient_data").increment(1);
            return Vec::new();
        }

        let universal: [RuleFn; 10] = [
            Self::check_ctr_decline,
            Self::check_conversion_rate_decline,
            Self::check_roas_target,
            Self::check_budget_utilization,
            Self::check_bid_optimization,
            Self::check_audience_opportunity,
            Self::check_cpa_increase,
            Self::check_conversion_rate_floor,
            Self::check_scaling_opportunity,
            Self::check_cpm_spike,
        ];

        let mut insights: Vec<AdInsight> = universal
            .iter()
            .filter_map(|rule| rule(self, context))
            .collect();
        insights.extend(self.platform_insights(context));
        sort_insights(&mut insights);

        for insight in &insights {
            metrics::counter!("insights.generated", "severity" => insight.severity.as_str())
                .increment(1);
        }
        info!(
            campaign_id = %context.campaign.id,
            count = insights.len(),
            "Generated insights"
        );
        insights
    }

    /// Compare revenue ROAS across platforms for a set of campaigns.
    pub fn generate_cross_platform_insights(&self, contexts: &[InsightContext]) -> Vec<AdInsight> {
        // platform -> (cost, conversion value)
        let mut totals: BTreeMap<Platform, (f64, f64)> = BTreeMap::new();
        for context in contexts {
            let current = &context.timeframe.current;
            if !self.has_sufficient_data(current) {
                continue;
            }
            if let Some(platform) = current.platform() {
                let entry = totals.entry(platform).or_insert((0.0, 0.0));
                entry.0 += current.cost;
                entry.1 += current.conversion_value;
            }
        }

        let roas: Vec<(Platform, f64, f64)> = totals
            .into_iter()
            .filter(|(_, (cost, _))| *cost > 0.0)
            .map(|(platform, (cost, value))| (platform, value / cost, cost))
            .collect();
        if roas.len() < 2 {
            return Vec::new();
        }

        let best = roas.iter().max_by(|a, b| a.1.total_cmp(&b.1));
        let worst = roas.iter().min_by(|a, b| a.1.total_cmp(&b.1));
        let (
            Some(&(best_platform, best_roas, _)),
            Some(&(worst_platform, worst_roas, worst_cost)),
        ) = (best, worst)
        else {
            return Vec::new();
        };

        if worst_roas <= 0.0 || best_roas / worst_roas < self.rules.platform_arbitrage_ratio {
            return Vec::new();
        }

        let shifted = worst_cost * 0.2;
        let finding = Finding {
            insight_type: InsightType::PlatformArbitrage,
            severity: Severity::Opportunity,
            confidence: 75,
            description: format!(
                "{} returns {:.2}x ROAS against {:.2}x on {} ({:.1}x gap).",
                best_platform.display_name(),
                best_roas,
                worst_roas,
                worst_platform.display_name(),
                best_roas / worst_roas
            ),
            recommendation: format!(
                "Shift about 20% of {} budget to {} and re-evaluate after one full window.",
                worst_platform.display_name(),
                best_platform.display_name()
            ),
            impact_usd: shifted * (best_roas - worst_roas),
            impact_label: "in additional revenue from reallocation",
        };

        vec![self.finish(finding, Scope::portfolio())]
    }

    /// Per-campaign insights plus cross-platform arbitrage, most urgent first.
    pub fn analyze_portfolio(&self, contexts: &[InsightContext]) -> Vec<AdInsight> {
        let mut insights: Vec<AdInsight> = contexts
            .iter()
            .flat_map(|context| self.generate_insights(context))
            .collect();
        insights.extend(self.generate_cross_platform_insights(contexts));
        sort_insights(&mut insights);
        insights
    }

    // -- platform dispatch --------------------------------------------------

    fn platform_insights(&self, context: &InsightContext) -> Vec<AdInsight> {
        match &context.timeframe.current.extension {
            Some(PlatformExtension::Google(google)) => [
                self.check_quality_score(context, google),
                self.check_impression_share(context, google),
                self.check_budget_lost_share(context, google),
                self.check_rank_lost_share(context, google),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Some(PlatformExtension::Meta(meta)) => [
                self.check_ad_fatigue(context, meta),
                self.check_quality_ranking(context, meta),
                self.check_video_completion(context, meta),
            ]
            .into_iter()
            .flatten()
            .collect(),
            None => Vec::new(),
        }
    }

    // -- universal rules ----------------------------------------------------

    fn check_ctr_decline(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let previous = &context.timeframe.previous;
        if previous.ctr <= 0.0 {
            return None;
        }
        let drop = pct_drop(previous.ctr, current.ctr);
        if drop < self.rules.critical_ctr_drop_pct {
            return None;
        }

        let lost_clicks = (previous.ctr - current.ctr) / 100.0 * current.impressions as f64;
        self.emit(
            context,
            Finding {
                insight_type: InsightType::CtrDecline,
                severity: Severity::Critical,
                confidence: 85,
                description: format!(
                    "CTR fell {:.1}% from {:.2}% to {:.2}% over the last {} days.",
                    drop, previous.ctr, current.ctr, self.rules.short_term_days
                ),
                recommendation:
                    "Refresh creatives and check targeting for audience drift.".to_string(),
                impact_usd: lost_clicks * current.cost_per_click(),
                impact_label: "in lost click value",
            },
        )
    }

    fn check_conversion_rate_decline(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let previous = &context.timeframe.previous;
        if current.conversions < self.rules.minimum_conversions || previous.conversion_rate <= 0.0 {
            return None;
        }
        let drop = pct_drop(previous.conversion_rate, current.conversion_rate);
        if drop < self.rules.conversion_rate_drop_pct {
            return None;
        }

        let lost_conversions =
            (previous.conversion_rate - current.conversion_rate) / 100.0 * current.clicks as f64;
        self.emit(
            context,
            Finding {
                insight_type: InsightType::ConversionRateDecline,
                severity: Severity::High,
                confidence: 80,
                description: format!(
                    "Conversion rate dropped {:.1}% from {:.2}% to {:.2}%.",
                    drop, previous.conversion_rate, current.conversion_rate
                ),
                recommendation:
                    "Audit the landing page and checkout flow for recent changes.".to_string(),
                impact_usd: lost_conversions * value_per_conversion(current),
                impact_label: "in lost conversion value",
            },
        )
    }

    fn check_roas_target(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let target = self.rules.roas_target;
        if current.roas >= target {
            return None;
        }

        let severity = if current.roas < 1.0 {
            Severity::Critical
        } else if current.roas < 2.0 {
            Severity::High
        } else {
            Severity::Medium
        };
        self.emit(
            context,
            Finding {
                insight_type: InsightType::RoasBelowTarget,
                severity,
                confidence: 90,
                description: format!(
                    "ROAS is {:.2}x against a {:.2}x target on ${:.0} spend.",
                    current.roas, target, current.cost
                ),
                recommendation:
                    "Use value-based bidding and pause low-return segments.".to_string(),
                impact_usd: (target - current.roas) * current.cost,
                impact_label: "in revenue gap to target",
            },
        )
    }

    fn check_budget_utilization(&self, context: &InsightContext) -> Option<AdInsight> {
        let budget = context.campaign.budget;
        if budget <= 0.0 {
            return None;
        }
        let current = &context.timeframe.current;
        let days = f64::from(self.rules.short_term_days);
        let daily_spend = current.cost / days;
        let utilization = daily_spend / budget * 100.0;

        if utilization > self.rules.budget_exhaustion_pct {
            self.emit(
                context,
                Finding {
                    insight_type: InsightType::BudgetExhaustion,
                    severity: Severity::High,
                    confidence: 85,
                    description: format!(
                        "Average daily spend ${:.2} uses {:.0}% of the ${:.2} daily budget.",
                        daily_spend, utilization, budget
                    ),
                    recommendation:
                        "Raise the budget if returns hold, or tighten targeting.".to_string(),
                    impact_usd: budget * 0.2 * days * current.roas,
                    impact_label: "in additional revenue from a 20% budget increase",
                },
            )
        } else if utilization < self.rules.budget_underutilization_pct {
            self.emit(
                context,
                Finding {
                    insight_type: InsightType::BudgetUnderutilization,
                    severity: Severity::Medium,
                    confidence: 80,
                    description: format!(
                        "Average daily spend ${:.2} uses only {:.0}% of the ${:.2} daily budget.",
                        daily_spend, utilization, budget
                    ),
                    recommendation:
                        "Broaden targeting or raise bids, or reallocate the budget.".to_string(),
                    impact_usd: (budget - daily_spend) * days,
                    impact_label: "in unspent budget",
                },
            )
        } else {
            None
        }
    }

    fn check_bid_optimization(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let industry_cpa = context.benchmarks.industry.cpa;
        if industry_cpa <= 0.0 {
            return None;
        }
        if current.cpa <= industry_cpa * (1.0 + self.rules.cpa_premium_pct / 100.0) {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::BidOptimization,
                severity: Severity::High,
                confidence: 75,
                description: format!(
                    "CPA ${:.2} is {:.0}% above the ${:.2} industry benchmark.",
                    current.cpa,
                    (current.cpa / industry_cpa - 1.0) * 100.0,
                    industry_cpa
                ),
                recommendation:
                    "Switch to target-CPA bidding and lower bids above target.".to_string(),
                impact_usd: (current.cpa - industry_cpa) * current.conversions,
                impact_label: "in acquisition cost savings",
            },
        )
    }

    fn check_audience_opportunity(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let account_ctr = context.benchmarks.account.ctr;
        if account_ctr <= 0.0 {
            return None;
        }
        if current.ctr <= account_ctr * (1.0 + self.rules.audience_ctr_lift_pct / 100.0) {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::AudienceExpansion,
                severity: Severity::Opportunity,
                confidence: 85,
                description: format!(
                    "CTR {:.2}% is {:.0}% above the account average of {:.2}%.",
                    current.ctr,
                    (current.ctr / account_ctr - 1.0) * 100.0,
                    account_ctr
                ),
                recommendation:
                    "Build lookalike audiences from this campaign's converters.".to_string(),
                impact_usd: current.cost * 0.5,
                impact_label: "in additional high-engagement spend",
            },
        )
    }

    fn check_cpa_increase(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let previous = &context.timeframe.previous;
        if current.conversions < self.rules.minimum_conversions || previous.cpa <= 0.0 {
            return None;
        }
        let rise = pct_rise(previous.cpa, current.cpa);
        if rise < self.rules.cost_increase_alert_pct {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::CpaIncrease,
                severity: Severity::High,
                confidence: 80,
                description: format!(
                    "CPA rose {:.1}% from ${:.2} to ${:.2}.",
                    rise, previous.cpa, current.cpa
                ),
                recommendation:
                    "Review recent bid changes and exclude spiking segments.".to_string(),
                impact_usd: (current.cpa - previous.cpa) * current.conversions,
                impact_label: "in extra acquisition cost",
            },
        )
    }

    fn check_conversion_rate_floor(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let floor = self.rules.conversion_rate_floor;
        if current.clicks == 0 || current.conversion_rate >= floor {
            return None;
        }

        let missing = (floor - current.conversion_rate) / 100.0 * current.clicks as f64;
        self.emit(
            context,
            Finding {
                insight_type: InsightType::ConversionRateLow,
                severity: Severity::Medium,
                confidence: 70,
                description: format!(
                    "Only {:.2}% of {} clicks convert, below the {:.2}% floor.",
                    current.conversion_rate, current.clicks, floor
                ),
                recommendation:
                    "Match landing page messaging to the ad and simplify forms.".to_string(),
                impact_usd: missing * value_per_conversion(current),
                impact_label: "in conversion value at the floor rate",
            },
        )
    }

    fn check_scaling_opportunity(&self, context: &InsightContext) -> Option<AdInsight> {
        let current = &context.timeframe.current;
        let top_roas = context.benchmarks.top_performing.roas;
        if top_roas <= 0.0 || current.roas < top_roas || current.roas < self.rules.roas_target {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::ScalingOpportunity,
                severity: Severity::Opportunity,
                confidence: 80,
                description: format!(
                    "ROAS {:.2}x matches or beats the top performer's {:.2}x.",
                    current.roas, top_roas
                ),
                recommendation:
                    "Raise budget about 20% every few days while ROAS holds.".to_string(),
                impact_usd: current.cost * 0.2 * current.roas,
                impact_label: "in additional revenue from a 20% budget increase",
            },
        )
    }

    fn check_cpm_spike(&self, context: &InsightContext) -> Option<AdInsight> {
        let (Some(current), Some(previous)) = (
            context.timeframe.current.meta(),
            context.timeframe.previous.meta(),
        ) else {
            return None;
        };
        if previous.cpm <= 0.0 {
            return None;
        }
        let rise = pct_rise(previous.cpm, current.cpm);
        if rise < self.rules.cost_increase_alert_pct {
            return None;
        }

        let impressions = context.timeframe.current.impressions as f64;
        self.emit(
            context,
            Finding {
                insight_type: InsightType::CpmSpike,
                severity: Severity::Medium,
                confidence: 70,
                description: format!(
                    "CPM rose {:.1}% from ${:.2} to ${:.2}.",
                    rise, previous.cpm, current.cpm
                ),
                recommendation: "Check auction pressure and test broader placements.".to_string(),
                impact_usd: (current.cpm - previous.cpm) / 1000.0 * impressions,
                impact_label: "in extra media cost",
            },
        )
    }

    // -- Google rules -------------------------------------------------------

    fn check_quality_score(
        &self,
        context: &InsightContext,
        google: &GoogleMetrics,
    ) -> Option<AdInsight> {
        let floor = self.rules.quality_score_floor;
        if google.quality_score >= floor {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::QualityScoreDrop,
                severity: Severity::High,
                confidence: 90,
                description: format!(
                    "Average keyword quality score is {:.1}, below the floor of {:.0}.",
                    google.quality_score, floor
                ),
                recommendation:
                    "Tighten ad groups and improve ad and landing page relevance.".to_string(),
                impact_usd: context.timeframe.current.cost * (floor - google.quality_score) / 10.0,
                impact_label: "in potential CPC savings",
            },
        )
    }

    fn check_impression_share(
        &self,
        context: &InsightContext,
        google: &GoogleMetrics,
    ) -> Option<AdInsight> {
        let floor = self.rules.impression_share_floor;
        if google.impression_share >= floor {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::ImpressionShareLoss,
                severity: Severity::Medium,
                confidence: 80,
                description: format!(
                    "Impression share is {:.1}%, below the {:.0}% floor.",
                    google.impression_share, floor
                ),
                recommendation:
                    "Raise bids on converting keywords or increase the budget.".to_string(),
                impact_usd: context.timeframe.current.cost * (floor - google.impression_share)
                    / 100.0,
                impact_label: "in unclaimed search demand",
            },
        )
    }

    fn check_budget_lost_share(
        &self,
        context: &InsightContext,
        google: &GoogleMetrics,
    ) -> Option<AdInsight> {
        if google.budget_lost_is <= self.rules.lost_impression_share_alert_pct {
            return None;
        }

        let current = &context.timeframe.current;
        self.emit(
            context,
            Finding {
                insight_type: InsightType::BudgetLimitedImpressionShare,
                severity: Severity::Medium,
                confidence: 80,
                description: format!(
                    "{:.1}% of eligible impressions were lost to budget.",
                    google.budget_lost_is
                ),
                recommendation:
                    "Raise the budget or shift it from lower-ROAS campaigns.".to_string(),
                impact_usd: current.cost * google.budget_lost_is / 100.0 * current.roas,
                impact_label: "in revenue lost to budget caps",
            },
        )
    }

    fn check_rank_lost_share(
        &self,
        context: &InsightContext,
        google: &GoogleMetrics,
    ) -> Option<AdInsight> {
        if google.rank_lost_is <= self.rules.lost_impression_share_alert_pct {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::RankLimitedImpressionShare,
                severity: Severity::Medium,
                confidence: 75,
                description: format!(
                    "{:.1}% of eligible impressions were lost to ad rank.",
                    google.rank_lost_is
                ),
                recommendation:
                    "Improve quality score and ad extensions before raising bids.".to_string(),
                impact_usd: context.timeframe.current.cost * google.rank_lost_is / 100.0,
                impact_label: "in spend lost to ad rank",
            },
        )
    }

    // -- Meta rules ---------------------------------------------------------

    fn check_ad_fatigue(&self, context: &InsightContext, meta: &MetaMetrics) -> Option<AdInsight> {
        let ceiling = self.rules.frequency_ceiling;
        if meta.frequency <= ceiling {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::AdFatigue,
                severity: Severity::Medium,
                confidence: 80,
                description: format!(
                    "Frequency is {:.2}, above the {:.1} ceiling; {} people saw them often.",
                    meta.frequency, ceiling, meta.reach
                ),
                recommendation: "Rotate in new creatives and broaden the audience.".to_string(),
                impact_usd: context.timeframe.current.cost * 0.15,
                impact_label: "in spend on repeat impressions",
            },
        )
    }

    fn check_quality_ranking(
        &self,
        context: &InsightContext,
        meta: &MetaMetrics,
    ) -> Option<AdInsight> {
        if meta.quality_ranking != Ranking::BelowAverage {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::QualityRankingLow,
                severity: Severity::High,
                confidence: 85,
                description:
                    "Meta ranks this ad's quality below average against rivals.".to_string(),
                recommendation:
                    "Replace low-quality creative and avoid engagement bait.".to_string(),
                impact_usd: context.timeframe.current.cost * 0.2,
                impact_label: "in potential CPM savings",
            },
        )
    }

    fn check_video_completion(
        &self,
        context: &InsightContext,
        meta: &MetaMetrics,
    ) -> Option<AdInsight> {
        let floor = self.rules.video_completion_floor;
        if meta.video_completion_rate >= floor {
            return None;
        }

        self.emit(
            context,
            Finding {
                insight_type: InsightType::VideoCompletionLow,
                severity: Severity::Medium,
                confidence: 75,
                description: format!(
                    "Only {:.1}% of video views complete, below the {:.0}% floor.",
                    meta.video_completion_rate, floor
                ),
                recommendation:
                    "Front-load the message in the first seconds and cut shorter.".to_string(),
                impact_usd: context.timeframe.current.cost * 0.1,
                impact_label: "in underperforming video spend",
            },
        )
    }

    // -- helpers ------------------------------------------------------------

    fn emit(&self, context: &InsightContext, finding: Finding) -> Option<AdInsight> {
        Some(self.finish(finding, Scope::of(context)))
    }

    fn finish(&self, finding: Finding, scope: Scope) -> AdInsight {
        let meta = template(finding.insight_type);
        let impact_usd = if finding.impact_usd.is_finite() {
            finding.impact_usd.max(0.0).round()
        } else {
            0.0
        };

        AdInsight {
            id: format!("{}_{}", finding.insight_type, scope.key),
            insight_type: finding.insight_type,
            severity: finding.severity,
            title: meta.title.to_string(),
            description: finding.description,
            recommendation: finding.recommendation,
            estimated_impact: format!("${:.0} {}", impact_usd, finding.impact_label),
            estimated_impact_usd: impact_usd,
            confidence: finding.confidence.min(100),
            data_points: meta.data_points.iter().map(|d| d.to_string()).collect(),
            platform: scope.platform,
            campaign_id: scope.campaign_id,
            ad_set_id: scope.ad_set_id,
            ad_id: scope.ad_id,
            timeframe: format!("last_{}_days", self.rules.short_term_days),
            actionable: meta.actionable,
            automation_possible: meta.automation_possible,
        }
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(InsightRules::default())
    }
}

/// Severity rank ascending, then confidence descending. Stable.
pub fn sort_insights(insights: &mut [AdInsight]) {
    insights.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then(b.confidence.cmp(&a.confidence))
    });
}

fn pct_drop(previous: f64, current: f64) -> f64 {
    (previous - current) / previous * 100.0
}

fn pct_rise(previous: f64, current: f64) -> f64 {
    (current - previous) / previous * 100.0
}

/// Average order value, falling back to CPA when no revenue is tracked.
fn value_per_conversion(snapshot: &MetricsSnapshot) -> f64 {
    if snapshot.conversions > 0.0 && snapshot.conversion_value > 0.0 {
        snapshot.conversion_value / snapshot.conversions
    } else {
        snapshot.cpa
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mia_core::error::MiaError;
    use mia_core::types::{AdMeta, AdSetMeta, Benchmarks, CampaignMeta, CampaignStatus, Timeframe};

    /// A healthy Google campaign that trips no rule under default thresholds.
    fn healthy_snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            campaign_id: "c-1".to_string(),
            campaign_name: "Spring Sale".to_string(),
            impressions: 50_000,
            clicks: 1_000,
            ctr: 2.0,
            cost: 5_000.0,
            conversions: 50.0,
            conversion_rate: 5.0,
            cpa: 100.0,
            roas: 4.0,
            conversion_value: 20_000.0,
            extension: Some(PlatformExtension::Google(GoogleMetrics {
                quality_score: 8.0,
                impression_share: 85.0,
                search_impression_share: 85.0,
                budget_lost_is: 5.0,
                rank_lost_is: 10.0,
                ..GoogleMetrics::default()
            })),
            ..MetricsSnapshot::default()
        }
    }

    fn context(current: MetricsSnapshot) -> InsightContext {
        InsightContext {
            campaign: CampaignMeta {
                id: "c-1".to_string(),
                name: "Spring Sale".to_string(),
                objective: "conversions".to_string(),
                // 5000 / 7 ≈ 714 per day → ~71% utilization
                budget: 1_000.0,
                bid_strategy: "target_roas".to_string(),
                status: CampaignStatus::Active,
            },
            ad_set: None,
            ad: None,
            timeframe: Timeframe {
                previous: current.clone(),
                baseline: current.clone(),
                current,
            },
            benchmarks: Benchmarks {
                industry: MetricsSnapshot {
                    cpa: 90.0,
                    ctr: 2.0,
                    ..MetricsSnapshot::default()
                },
                account: MetricsSnapshot {
                    ctr: 2.0,
                    ..MetricsSnapshot::default()
                },
                top_performing: MetricsSnapshot {
                    roas: 6.0,
                    ..MetricsSnapshot::default()
                },
            },
        }
    }

    fn types(insights: &[AdInsight]) -> Vec<InsightType> {
        insights.iter().map(|i| i.insight_type).collect()
    }

    fn find(insights: &[AdInsight], insight_type: InsightType) -> Option<&AdInsight> {
        insights.iter().find(|i| i.insight_type == insight_type)
    }

    #[test]
    fn test_healthy_campaign_has_no_insights() {
        let engine = InsightEngine::default();
        let insights = engine.generate_insights(&context(healthy_snapshot()));
        assert!(insights.is_empty(), "unexpected insights: {:?}", types(&insights));
    }

    // 1. Data gate -----------------------------------------------------------

    #[test]
    fn test_low_spend_returns_nothing() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.cost = 99.99;
        current.roas = 0.1;
        assert!(engine.generate_insights(&context(current)).is_empty());
    }

    #[test]
    fn test_low_impressions_returns_nothing() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.impressions = 999;
        current.roas = 0.1;
        assert!(engine.generate_insights(&context(current)).is_empty());
    }

    #[test]
    fn test_gate_boundary_is_inclusive() {
        let engine = InsightEngine::default();
        let current = MetricsSnapshot {
            cost: 100.0,
            impressions: 1000,
            ..MetricsSnapshot::default()
        };
        assert!(engine.has_sufficient_data(&current));
    }

    // 2. CTR decline ----------------------------------------------------------

    #[test]
    fn test_ctr_decline_fires_at_33_percent() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.timeframe.previous.ctr = 1.5;
        ctx.timeframe.current.ctr = 1.0;
        ctx.benchmarks.account.ctr = 1.0;

        let insights = engine.generate_insights(&ctx);
        let ctr = find(&insights, InsightType::CtrDecline).expect("CTR decline");
        assert_eq!(ctr.severity, Severity::Critical);
        assert_eq!(ctr.confidence, 85);
        // 0.5% of 50k impressions = 250 clicks at $5 CPC
        assert_eq!(ctr.estimated_impact_usd, 1250.0);
        assert!(ctr.estimated_impact.starts_with("$1250"));
    }

    #[test]
    fn test_ctr_decline_ignores_25_percent_drop() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.timeframe.previous.ctr = 2.0;
        ctx.timeframe.current.ctr = 1.5;
        ctx.benchmarks.account.ctr = 1.5;

        let insights = engine.generate_insights(&ctx);
        assert!(find(&insights, InsightType::CtrDecline).is_none());
    }

    #[test]
    fn test_ctr_decline_skipped_without_previous_ctr() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.timeframe.previous.ctr = 0.0;
        assert!(find(&engine.generate_insights(&ctx), InsightType::CtrDecline).is_none());
    }

    // 3. Conversion-rate decline ---------------------------------------------

    #[test]
    fn test_conversion_rate_decline() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.timeframe.previous.conversion_rate = 7.0;

        let insights = engine.generate_insights(&ctx);
        let cr = find(&insights, InsightType::ConversionRateDecline).expect("decline");
        assert_eq!(cr.severity, Severity::High);
        assert_eq!(cr.confidence, 80);
    }

    #[test]
    fn test_conversion_rate_decline_needs_minimum_conversions() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.timeframe.previous.conversion_rate = 7.0;
        ctx.timeframe.current.conversions = 4.0;

        let insights = engine.generate_insights(&ctx);
        assert!(find(&insights, InsightType::ConversionRateDecline).is_none());
    }

    // 4. ROAS -----------------------------------------------------------------

    #[test]
    fn test_roas_severity_bands() {
        let engine = InsightEngine::default();
        for (roas, expected) in [
            (0.5, Severity::Critical),
            (1.5, Severity::High),
            (2.5, Severity::Medium),
        ] {
            let mut current = healthy_snapshot();
            current.roas = roas;
            current.conversion_value = roas * current.cost;
            let insights = engine.generate_insights(&context(current));
            let insight = find(&insights, InsightType::RoasBelowTarget).expect("roas insight");
            assert_eq!(insight.severity, expected, "roas {roas}");
            assert_eq!(insight.confidence, 90);
            assert!(insight.automation_possible);
        }
    }

    #[test]
    fn test_roas_impact_is_gap_times_cost() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.roas = 2.5;
        let insights = engine.generate_insights(&context(current));
        let insight = find(&insights, InsightType::RoasBelowTarget).unwrap();
        assert_eq!(insight.estimated_impact_usd, 2500.0);
    }

    #[test]
    fn test_roas_target_is_configurable() {
        let engine = InsightEngine::new(InsightRules {
            roas_target: 2.0,
            ..InsightRules::default()
        });
        let mut current = healthy_snapshot();
        current.roas = 2.5;
        let insights = engine.generate_insights(&context(current));
        assert!(find(&insights, InsightType::RoasBelowTarget).is_none());
    }

    // 5. Budget ---------------------------------------------------------------

    #[test]
    fn test_budget_underutilization_example() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.cost = 980.0;
        let insights = engine.generate_insights(&context(current));

        let budget =
            find(&insights, InsightType::BudgetUnderutilization).expect("underutilization");
        assert_eq!(budget.severity, Severity::Medium);
        assert!(budget.description.contains("14%"));
        // (1000 - 140) * 7
        assert_eq!(budget.estimated_impact_usd, 6020.0);
        assert!(find(&insights, InsightType::BudgetExhaustion).is_none());
    }

    #[test]
    fn test_budget_exhaustion() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.cost = 7_000.0;
        current.roas = 4.0;
        let insights = engine.generate_insights(&context(current));
        let budget = find(&insights, InsightType::BudgetExhaustion).expect("exhaustion");
        assert_eq!(budget.severity, Severity::High);
    }

    #[test]
    fn test_budget_healthy_band_is_silent() {
        let engine = InsightEngine::default();
        let insights = engine.generate_insights(&context(healthy_snapshot()));
        assert!(find(&insights, InsightType::BudgetExhaustion).is_none());
        assert!(find(&insights, InsightType::BudgetUnderutilization).is_none());
    }

    #[test]
    fn test_budget_rule_skipped_without_budget() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.campaign.budget = 0.0;
        ctx.timeframe.current.cost = 150.0;
        let insights = engine.generate_insights(&ctx);
        assert!(find(&insights, InsightType::BudgetUnderutilization).is_none());
    }

    // 6. Bids and audience ----------------------------------------------------

    #[test]
    fn test_bid_optimization_against_industry_cpa() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.benchmarks.industry.cpa = 60.0;
        let insights = engine.generate_insights(&ctx);
        let bid = find(&insights, InsightType::BidOptimization).expect("bid insight");
        assert_eq!(bid.severity, Severity::High);
        assert_eq!(bid.confidence, 75);
        assert!(bid.automation_possible);
        // (100 - 60) * 50
        assert_eq!(bid.estimated_impact_usd, 2000.0);
    }

    #[test]
    fn test_audience_opportunity() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.benchmarks.account.ctr = 1.2;
        let insights = engine.generate_insights(&ctx);
        let audience = find(&insights, InsightType::AudienceExpansion).expect("audience");
        assert_eq!(audience.severity, Severity::Opportunity);
        assert_eq!(audience.confidence, 85);
        assert!(audience.automation_possible);
    }

    #[test]
    fn test_cpa_increase() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.timeframe.previous.cpa = 70.0;
        let insights = engine.generate_insights(&ctx);
        let cpa = find(&insights, InsightType::CpaIncrease).expect("cpa increase");
        assert_eq!(cpa.severity, Severity::High);
        assert_eq!(cpa.estimated_impact_usd, 1500.0);
    }

    #[test]
    fn test_scaling_opportunity() {
        let engine = InsightEngine::default();
        let mut ctx = context(healthy_snapshot());
        ctx.benchmarks.top_performing.roas = 3.5;
        let insights = engine.generate_insights(&ctx);
        let scale = find(&insights, InsightType::ScalingOpportunity).expect("scaling");
        assert_eq!(scale.severity, Severity::Opportunity);
    }

    #[test]
    fn test_conversion_rate_floor() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.conversion_rate = 0.5;
        current.conversions = 5.0;
        let mut ctx = context(current);
        ctx.timeframe.previous.conversion_rate = 0.5;
        let insights = engine.generate_insights(&ctx);
        assert!(find(&insights, InsightType::ConversionRateLow).is_some());
    }

    // 7. Google ---------------------------------------------------------------

    fn with_google(mut snapshot: MetricsSnapshot, google: GoogleMetrics) -> MetricsSnapshot {
        snapshot.extension = Some(PlatformExtension::Google(google));
        snapshot
    }

    #[test]
    fn test_google_quality_and_share_rules() {
        let engine = InsightEngine::default();
        let current = with_google(
            healthy_snapshot(),
            GoogleMetrics {
                quality_score: 4.0,
                impression_share: 55.0,
                budget_lost_is: 25.0,
                rank_lost_is: 30.0,
                ..GoogleMetrics::default()
            },
        );
        let insights = engine.generate_insights(&context(current));

        let qs = find(&insights, InsightType::QualityScoreDrop).expect("quality score");
        assert_eq!((qs.severity, qs.confidence), (Severity::High, 90));
        assert_eq!(qs.platform, InsightPlatform::Google);

        let share = find(&insights, InsightType::ImpressionShareLoss).expect("impression share");
        assert_eq!((share.severity, share.confidence), (Severity::Medium, 80));
        assert!(share.automation_possible);

        assert!(find(&insights, InsightType::BudgetLimitedImpressionShare).is_some());
        assert!(find(&insights, InsightType::RankLimitedImpressionShare).is_some());
    }

    // 8. Meta -----------------------------------------------------------------

    fn meta_snapshot(meta: MetaMetrics) -> MetricsSnapshot {
        let mut snapshot = healthy_snapshot();
        snapshot.extension = Some(PlatformExtension::Meta(meta));
        snapshot
    }

    fn healthy_meta() -> MetaMetrics {
        MetaMetrics {
            reach: 20_000,
            frequency: 2.5,
            cpm: 100.0,
            video_views: 4_000,
            video_completion_rate: 40.0,
            ..MetaMetrics::default()
        }
    }

    #[test]
    fn test_healthy_meta_campaign_has_no_insights() {
        let engine = InsightEngine::default();
        let insights = engine.generate_insights(&context(meta_snapshot(healthy_meta())));
        assert!(insights.is_empty(), "unexpected insights: {:?}", types(&insights));
    }

    #[test]
    fn test_meta_rules() {
        let engine = InsightEngine::default();
        let current = meta_snapshot(MetaMetrics {
            frequency: 4.1,
            quality_ranking: Ranking::BelowAverage,
            video_completion_rate: 12.0,
            ..healthy_meta()
        });
        let insights = engine.generate_insights(&context(current));

        let fatigue = find(&insights, InsightType::AdFatigue).expect("fatigue");
        assert_eq!((fatigue.severity, fatigue.confidence), (Severity::Medium, 80));
        assert_eq!(fatigue.platform, InsightPlatform::Meta);

        let ranking = find(&insights, InsightType::QualityRankingLow).expect("ranking");
        assert_eq!((ranking.severity, ranking.confidence), (Severity::High, 85));

        let video = find(&insights, InsightType::VideoCompletionLow).expect("video");
        assert_eq!((video.severity, video.confidence), (Severity::Medium, 75));
    }

    #[test]
    fn test_meta_cpm_spike() {
        let engine = InsightEngine::default();
        let mut ctx = context(meta_snapshot(MetaMetrics {
            cpm: 130.0,
            ..healthy_meta()
        }));
        ctx.timeframe.previous = meta_snapshot(healthy_meta());
        let insights = engine.generate_insights(&ctx);
        let spike = find(&insights, InsightType::CpmSpike).expect("cpm spike");
        // $30 more per mille over 50k impressions
        assert_eq!(spike.estimated_impact_usd, 1500.0);
    }

    #[test]
    fn test_platform_rules_skipped_without_extension() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.extension = None;
        let insights = engine.generate_insights(&context(current));
        assert!(insights.is_empty());
    }

    // 9. Ordering and scope ---------------------------------------------------

    #[test]
    fn test_output_sorted_by_severity_then_confidence() {
        let engine = InsightEngine::default();
        let mut current = meta_snapshot(MetaMetrics {
            frequency: 5.0,
            quality_ranking: Ranking::BelowAverage,
            video_completion_rate: 10.0,
            ..healthy_meta()
        });
        current.roas = 0.8;
        current.ctr = 1.0;
        let mut ctx = context(current);
        ctx.timeframe.previous.ctr = 2.0;
        ctx.timeframe.previous.conversion_rate = 8.0;
        ctx.benchmarks.industry.cpa = 50.0;
        ctx.benchmarks.account.ctr = 0.5;

        let insights = engine.generate_insights(&ctx);
        assert!(insights.len() >= 6);
        for pair in insights.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.severity.rank() <= b.severity.rank());
            if a.severity == b.severity {
                assert!(a.confidence >= b.confidence);
            }
        }
        assert_eq!(insights[0].severity, Severity::Critical);
        assert_eq!(insights.last().unwrap().severity, Severity::Opportunity);
    }

    #[test]
    fn test_insight_scope_and_timeframe() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.roas = 1.0;
        let mut ctx = context(current);
        ctx.ad_set = Some(AdSetMeta {
            id: "as-9".to_string(),
            name: "Retargeting".to_string(),
        });
        let insights = engine.generate_insights(&ctx);
        let roas = find(&insights, InsightType::RoasBelowTarget).unwrap();
        assert_eq!(roas.id, "roas_below_target_c-1_as-9");
        assert_eq!(roas.campaign_id.as_deref(), Some("c-1"));
        assert_eq!(roas.ad_set_id.as_deref(), Some("as-9"));
        assert_eq!(roas.ad_id, None);
        assert_eq!(roas.timeframe, "last_7_days");
        assert_eq!(roas.title, "ROAS Below Target");
    }

    #[test]
    fn test_ids_unique_across_ad_sets_of_one_campaign() {
        let engine = InsightEngine::default();
        let contexts: Vec<InsightContext> = ["as-1", "as-2"]
            .into_iter()
            .map(|ad_set| {
                let mut current = healthy_snapshot();
                current.roas = 0.5;
                let mut ctx = context(current);
                ctx.ad_set = Some(AdSetMeta {
                    id: ad_set.to_string(),
                    name: ad_set.to_string(),
                });
                ctx
            })
            .collect();

        let insights = engine.analyze_portfolio(&contexts);
        let roas_ids: Vec<&str> = insights
            .iter()
            .filter(|i| i.insight_type == InsightType::RoasBelowTarget)
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(roas_ids.len(), 2);
        assert!(roas_ids.contains(&"roas_below_target_c-1_as-1"));
        assert!(roas_ids.contains(&"roas_below_target_c-1_as-2"));

        let mut ids: Vec<&str> = insights.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), insights.len());
    }

    #[test]
    fn test_id_includes_ad_after_ad_set() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.roas = 1.0;
        let mut ctx = context(current);
        ctx.ad_set = Some(AdSetMeta {
            id: "as-1".to_string(),
            name: "Retargeting".to_string(),
        });
        ctx.ad = Some(AdMeta {
            id: "ad-7".to_string(),
            name: "Carousel".to_string(),
        });
        let insights = engine.generate_insights(&ctx);
        let roas = find(&insights, InsightType::RoasBelowTarget).unwrap();
        assert_eq!(roas.id, "roas_below_target_c-1_as-1_ad-7");
        assert_eq!(roas.ad_id.as_deref(), Some("ad-7"));
    }

    #[test]
    fn test_campaign_level_id_has_no_suffix() {
        let engine = InsightEngine::default();
        let mut current = healthy_snapshot();
        current.roas = 1.0;
        let insights = engine.generate_insights(&context(current));
        let roas = find(&insights, InsightType::RoasBelowTarget).unwrap();
        assert_eq!(roas.id, "roas_below_target_c-1");
    }

    #[test]
    fn test_try_new_rejects_invalid_rules() {
        let rules = InsightRules {
            short_term_days: 0,
            ..InsightRules::default()
        };
        assert!(matches!(
            InsightEngine::try_new(rules),
            Err(MiaError::Validation(_))
        ));
        assert!(InsightEngine::try_new(InsightRules::default()).is_ok());
    }

    // 10. Cross-platform --------------------------------------------------------

    fn platform_context(
        id: &str,
        extension: PlatformExtension,
        cost: f64,
        value: f64,
    ) -> InsightContext {
        let mut current = healthy_snapshot();
        current.campaign_id = id.to_string();
        current.cost = cost;
        current.conversion_value = value;
        current.roas = value / cost;
        current.extension = Some(extension);
        let mut ctx = context(current);
        ctx.campaign.id = id.to_string();
        ctx
    }

    fn google_ext() -> PlatformExtension {
        PlatformExtension::Google(GoogleMetrics {
            quality_score: 8.0,
            impression_share: 90.0,
            ..GoogleMetrics::default()
        })
    }

    #[test]
    fn test_platform_arbitrage_ignores_small_gap() {
        let engine = InsightEngine::default();
        // 6.0x vs 5.0x
        let contexts = vec![
            platform_context("g-1", google_ext(), 5_000.0, 30_000.0),
            platform_context("m-1", PlatformExtension::Meta(healthy_meta()), 5_000.0, 25_000.0),
        ];
        assert!(engine.generate_cross_platform_insights(&contexts).is_empty());
    }

    #[test]
    fn test_platform_arbitrage_fires_on_large_gap() {
        let engine = InsightEngine::default();
        let contexts = vec![
            platform_context("g-1", google_ext(), 5_000.0, 30_000.0),
            platform_context("m-1", PlatformExtension::Meta(healthy_meta()), 5_000.0, 10_000.0),
        ];
        let insights = engine.generate_cross_platform_insights(&contexts);
        assert_eq!(insights.len(), 1);
        let arb = &insights[0];
        assert_eq!(arb.insight_type, InsightType::PlatformArbitrage);
        assert_eq!(arb.platform, InsightPlatform::CrossPlatform);
        assert_eq!(arb.campaign_id, None);
        // 20% of 5000 * (6 - 2)
        assert_eq!(arb.estimated_impact_usd, 4000.0);
    }

    #[test]
    fn test_platform_arbitrage_needs_two_platforms() {
        let engine = InsightEngine::default();
        let contexts = vec![platform_context(
            "m-1",
            PlatformExtension::Meta(healthy_meta()),
            5_000.0,
            10_000.0,
        )];
        assert!(engine.generate_cross_platform_insights(&contexts).is_empty());
    }
}
