//! Query processing: classify, scope, answer.

use crate::intent::{classify_intent, extract_entities, QueryEntities, QueryIntent};
use chrono::{DateTime, Utc};
use mia_analytics::{AnalyticsService, CampaignFilter, CampaignMetric};
use mia_core::config::AnalyticsConfig;
use mia_core::types::{Campaign, PerformanceInsight, PerformanceInsightKind, Platform};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::info;
use uuid::Uuid;

const DEFAULT_TREND_DAYS: u32 = 7;
const MAX_LISTED_INSIGHTS: usize = 3;

const HELP_MESSAGE: &str = "I can help with campaign performance, optimization ideas, \
platform comparisons, trends and budget allocation. Try \"How are my Google campaigns \
performing?\" or \"Compare Meta and Google\".";

/// A processed question with its answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingQuery {
    pub id: Uuid,
    pub user_id: String,
    pub query: String,
    pub intent: QueryIntent,
    pub entities: QueryEntities,
    pub response: String,
    pub insights: Vec<PerformanceInsight>,
    pub timestamp: DateTime<Utc>,
}

pub struct ChatService {
    campaigns: Vec<Campaign>,
    analytics: AnalyticsService,
}

impl ChatService {
    pub fn new(campaigns: Vec<Campaign>, config: AnalyticsConfig) -> Self {
        Self {
            campaigns,
            analytics: AnalyticsService::new(config),
        }
    }

    pub fn process_query(&self, query: &str, user_id: &str) -> MarketingQuery {
        let intent = classify_intent(query);
        let entities = extract_entities(query);

        let scoped: Vec<Campaign> = match entities.platform {
            Some(platform) => {
                let filter = CampaignFilter {
                    platforms: vec![platform],
                    ..CampaignFilter::default()
                };
                self.analytics
                    .filter_campaigns(&self.campaigns, &filter)
                    .into_iter()
                    .cloned()
                    .collect()
            }
            None => self.campaigns.clone(),
        };

        let insights = self.analytics.generate_insights(&scoped);
        let response = match intent {
            QueryIntent::Performance => self.performance_response(&scoped, &entities, &insights),
            QueryIntent::Optimization => self.optimization_response(&insights),
            QueryIntent::Comparison => self.comparison_response(&scoped),
            QueryIntent::Trend => self.trend_response(&scoped, &entities),
            QueryIntent::Budget => self.budget_response(&scoped, &insights),
            QueryIntent::General => HELP_MESSAGE.to_string(),
        };
        let insights: Vec<PerformanceInsight> = insights
            .into_iter()
            .filter(|i| relevant_to(intent, i.kind))
            .collect();

        info!(
            user_id = %user_id,
            intent = %intent,
            campaigns = scoped.len(),
            insights = insights.len(),
            "Processed marketing query"
        );

        MarketingQuery {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            intent,
            entities,
            response,
            insights,
            timestamp: Utc::now(),
        }
    }

    // ── formatters ──────────────────────────────────────────────────────

    fn performance_response(
        &self,
        campaigns: &[Campaign],
        entities: &QueryEntities,
        insights: &[PerformanceInsight],
    ) -> String {
        if campaigns.is_empty() {
            return no_data(entities.platform);
        }

        let spend: f64 = campaigns.iter().map(|c| c.spend).sum();
        let conversions: u64 = campaigns.iter().map(|c| c.conversions).sum();
        let clicks: u64 = campaigns.iter().map(|c| c.clicks).sum();
        let impressions: u64 = campaigns.iter().map(|c| c.impressions).sum();
        let ctr = if impressions > 0 {
            clicks as f64 / impressions as f64 * 100.0
        } else {
            0.0
        };

        let mut out = format!(
            "{} campaigns spent ${:.2} for {} conversions at a {:.2}% CTR.",
            campaigns.len(),
            spend,
            conversions,
            ctr
        );

        let metric = entities.metric.unwrap_or(CampaignMetric::Roas);
        if let Some(top) = self.analytics.get_top_performers(campaigns, metric, 1).first() {
            let _ = write!(
                out,
                " Best by {}: {} ({:.2}).",
                metric,
                top.name,
                metric.value(top)
            );
        }

        let alerts = insights
            .iter()
            .filter(|i| relevant_to(QueryIntent::Performance, i.kind))
            .count();
        if alerts > 0 {
            let _ = write!(out, " {alerts} performance issue(s) need attention.");
        }
        out
    }

    fn optimization_response(&self, insights: &[PerformanceInsight]) -> String {
        if insights.is_empty() {
            return "No optimization opportunities stand out right now.".to_string();
        }

        let mut out = format!("Found {} optimization opportunities:", insights.len());
        for insight in insights.iter().take(MAX_LISTED_INSIGHTS) {
            let _ = write!(
                out,
                "\n- [{}] {}: {}",
                insight.severity, insight.title, insight.recommendation
            );
        }
        out
    }

    fn comparison_response(&self, campaigns: &[Campaign]) -> String {
        let platforms = self.analytics.calculate_platform_metrics(campaigns);
        if platforms.len() < 2 {
            return "Comparisons need campaigns on at least two platforms.".to_string();
        }

        let mut out = String::from("Platform comparison:");
        for p in &platforms {
            let _ = write!(
                out,
                "\n- {}: ${:.2} spend, {} conversions, CPA ${:.2}, {:.2} conversions per $100",
                p.platform.display_name(),
                p.total_spend,
                p.total_conversions,
                p.average_cpa,
                p.conversion_index
            );
        }
        if let Some(best) = platforms
            .iter()
            .max_by(|a, b| a.conversion_index.total_cmp(&b.conversion_index))
        {
            let _ = write!(out, "\n{} is the most efficient.", best.platform.display_name());
        }
        out
    }

    fn trend_response(&self, campaigns: &[Campaign], entities: &QueryEntities) -> String {
        if campaigns.is_empty() {
            return no_data(entities.platform);
        }

        let days = match entities.timeframe.as_deref() {
            Some("today") | Some("yesterday") => 1,
            Some("last_30_days") | Some("this_month") | Some("last_month") => 30,
            _ => DEFAULT_TREND_DAYS,
        };
        let trend = self
            .analytics
            .calculate_trends(campaigns, days, Utc::now().date_naive());
        let Some(point) = trend.last() else {
            return no_data(entities.platform);
        };

        format!(
            "Over the last {} day(s): about ${:.2} spend, {:.1} conversions and \
             {:.0} clicks per day at a {:.2}% CTR. Daily figures are spread evenly \
             from current totals.",
            days, point.spend, point.conversions, point.clicks, point.ctr
        )
    }

    fn budget_response(&self, campaigns: &[Campaign], insights: &[PerformanceInsight]) -> String {
        if campaigns.is_empty() {
            return "No campaign data is available for budget analysis.".to_string();
        }

        let budget: f64 = campaigns.iter().map(|c| c.budget).sum();
        let spend: f64 = campaigns.iter().map(|c| c.spend).sum();
        let utilization = if budget > 0.0 { spend / budget * 100.0 } else { 0.0 };

        let mut out = format!(
            "${:.2} of ${:.2} budget spent ({:.1}% utilization).",
            spend, budget, utilization
        );
        if let Some(top) = self
            .analytics
            .get_top_performers(campaigns, CampaignMetric::Roas, 1)
            .first()
        {
            let _ = write!(out, " Highest ROAS: {} at {:.0}%.", top.name, top.roas);
        }
        for insight in insights
            .iter()
            .filter(|i| i.kind == PerformanceInsightKind::BudgetOptimization)
            .take(MAX_LISTED_INSIGHTS)
        {
            let _ = write!(out, "\n- {}: {}", insight.title, insight.recommendation);
        }
        out
    }
}

fn relevant_to(intent: QueryIntent, kind: PerformanceInsightKind) -> bool {
    match intent {
        QueryIntent::Performance => matches!(
            kind,
            PerformanceInsightKind::PerformanceAlert | PerformanceInsightKind::AdFatigue
        ),
        QueryIntent::Optimization => true,
        QueryIntent::Comparison => kind == PerformanceInsightKind::PlatformComparison,
        QueryIntent::Budget => kind == PerformanceInsightKind::BudgetOptimization,
        QueryIntent::Trend | QueryIntent::General => false,
    }
}

fn no_data(platform: Option<Platform>) -> String {
    match platform {
        Some(p) => format!("No {} campaign data is available.", p.display_name()),
        None => "No campaign data is available.".to_string(),
    }
}
