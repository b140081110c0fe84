//! Meta Marketing API campaign insights → [`MetricsSnapshot`].

use crate::{lenient, ratio, ratio_pct};
use chrono::NaiveDate;
use mia_core::error::MiaResult;
use mia_core::types::{MetaMetrics, MetricsSnapshot, PlatformExtension, Ranking};
use serde::Deserialize;
use tracing::debug;

/// Action types counted as conversions.
pub const CONVERSION_ACTIONS: [&str; 4] =
    ["purchase", "complete_registration", "lead", "add_to_cart"];

/// Action types counted as engagement.
pub const ENGAGEMENT_ACTIONS: [&str; 4] = ["post_reaction", "comment", "post", "like"];

const PURCHASE: &str = "purchase";
const VIDEO_VIEW: &str = "video_view";
const VIDEO_COMPLETE: &str = "video_complete";

// ---------------------------------------------------------------------------
// Raw payload
// ---------------------------------------------------------------------------

/// `GET /act_{id}/campaigns?fields=insights{...}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetaAdsPayload {
    pub data: Vec<MetaCampaign>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaCampaign {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub insights: Option<MetaInsights>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetaInsights {
    pub data: Vec<MetaInsightRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaInsightRow {
    #[serde(default, deserialize_with = "lenient::number")]
    pub impressions: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub clicks: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub spend: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub reach: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub frequency: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cpm: f64,
    #[serde(default)]
    pub actions: Vec<MetaAction>,
    #[serde(default)]
    pub conversion_values: Vec<MetaAction>,
    #[serde(default)]
    pub quality_ranking: Option<String>,
    #[serde(default)]
    pub engagement_rate_ranking: Option<String>,
    #[serde(default)]
    pub conversion_rate_ranking: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaAction {
    #[serde(default)]
    pub action_type: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Normalize every campaign that carries at least one insights row.
/// Campaigns without insights are dropped.
pub fn transform_meta_ads_data(raw: &MetaAdsPayload) -> Vec<MetricsSnapshot> {
    let snapshots: Vec<MetricsSnapshot> = raw
        .data
        .iter()
        .filter_map(|campaign| {
            let row = campaign.insights.as_ref().and_then(|i| i.data.first());
            if row.is_none() {
                debug!(campaign_id = %campaign.id, "Skipping Meta campaign without insights");
            }
            row.map(|row| transform_row(campaign, row))
        })
        .collect();

    debug!(
        campaigns = raw.data.len(),
        normalized = snapshots.len(),
        "Normalized Meta Ads insights"
    );
    snapshots
}

/// Parse a Meta Ads JSON document and normalize it.
pub fn transform_meta_ads_json(json: &str) -> MiaResult<Vec<MetricsSnapshot>> {
    let payload: MetaAdsPayload = serde_json::from_str(json)?;
    Ok(transform_meta_ads_data(&payload))
}

fn transform_row(campaign: &MetaCampaign, row: &MetaInsightRow) -> MetricsSnapshot {
    let conversions = sum_actions(&row.actions, &CONVERSION_ACTIONS);
    let conversion_value = sum_actions(&row.conversion_values, &[PURCHASE]);
    let engagements = sum_actions(&row.actions, &ENGAGEMENT_ACTIONS);
    let video_views = find_action(&row.actions, VIDEO_VIEW);

    let meta = MetaMetrics {
        reach: row.reach as u64,
        frequency: row.frequency,
        cpm: row.cpm,
        engagement_rate: ratio_pct(engagements, row.impressions),
        video_views: video_views.unwrap_or(0.0) as u64,
        video_completion_rate: video_completion_rate(&row.actions),
        quality_ranking: parse_ranking(row.quality_ranking.as_deref()),
        engagement_ranking: parse_ranking(row.engagement_rate_ranking.as_deref()),
        conversion_ranking: parse_ranking(row.conversion_rate_ranking.as_deref()),
    };

    MetricsSnapshot {
        campaign_id: campaign.id.clone(),
        campaign_name: campaign.name.clone(),
        date: row
            .date_start
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        impressions: row.impressions as u64,
        clicks: row.clicks as u64,
        ctr: ratio_pct(row.clicks, row.impressions),
        cost: row.spend,
        conversions,
        conversion_rate: ratio_pct(conversions, row.clicks),
        cpa: ratio(row.spend, conversions),
        roas: ratio(conversion_value, row.spend),
        conversion_value,
        extension: Some(PlatformExtension::Meta(meta)),
    }
}

fn sum_actions(actions: &[MetaAction], types: &[&str]) -> f64 {
    actions
        .iter()
        .filter(|a| types.contains(&a.action_type.as_str()))
        .map(|a| a.value)
        .sum()
}

fn find_action(actions: &[MetaAction], action_type: &str) -> Option<f64> {
    actions
        .iter()
        .find(|a| a.action_type == action_type)
        .map(|a| a.value)
}

/// Completed views over started views; 0 unless both entries are present.
fn video_completion_rate(actions: &[MetaAction]) -> f64 {
    match (
        find_action(actions, VIDEO_VIEW),
        find_action(actions, VIDEO_COMPLETE),
    ) {
        (Some(views), Some(completes)) => ratio_pct(completes, views),
        _ => 0.0,
    }
}

fn parse_ranking(label: Option<&str>) -> Ranking {
    label.map(Ranking::from_meta_label).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "data": [
            {
                "id": "238",
                "name": "Prospecting",
                "insights": {
                    "data": [
                        {
                            "impressions": "50000",
                            "clicks": "1000",
                            "spend": "2000.00",
                            "reach": "12500",
                            "frequency": "4.0",
                            "cpm": "40.0",
                            "actions": [
                                { "action_type": "purchase", "value": "20" },
                                { "action_type": "lead", "value": "15" },
                                { "action_type": "add_to_cart", "value": "5" },
                                { "action_type": "link_click", "value": "1000" },
                                { "action_type": "post_reaction", "value": "300" },
                                { "action_type": "comment", "value": "200" },
                                { "action_type": "video_view", "value": "4000" },
                                { "action_type": "video_complete", "value": "800" }
                            ],
                            "conversion_values": [
                                { "action_type": "purchase", "value": "5000" },
                                { "action_type": "lead", "value": "999" }
                            ],
                            "quality_ranking": "BELOW_AVERAGE_35",
                            "engagement_rate_ranking": "ABOVE_AVERAGE",
                            "date_start": "2024-03-01"
                        }
                    ]
                }
            },
            { "id": "239", "name": "No delivery" },
            { "id": "240", "name": "Empty insights", "insights": { "data": [] } },
            {
                "id": "241",
                "name": "Static creative",
                "insights": {
                    "data": [
                        {
                            "impressions": "1000",
                            "clicks": "0",
                            "spend": "bogus",
                            "actions": [ { "action_type": "video_view", "value": "100" } ]
                        }
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_campaigns_without_insights_are_dropped() {
        let snapshots = transform_meta_ads_json(RESPONSE).unwrap();
        let ids: Vec<&str> = snapshots.iter().map(|s| s.campaign_id.as_str()).collect();
        assert_eq!(ids, vec!["238", "241"]);
    }

    #[test]
    fn test_conversions_use_action_whitelist() {
        let snapshots = transform_meta_ads_json(RESPONSE).unwrap();
        let s = &snapshots[0];
        assert!((s.conversions - 40.0).abs() < 1e-9);
        assert!((s.conversion_value - 5000.0).abs() < 1e-9);
        assert!((s.roas - 2.5).abs() < 1e-9);
        assert!((s.cpa - 50.0).abs() < 1e-9);
        assert!((s.ctr - 2.0).abs() < 1e-9);
        assert!((s.conversion_rate - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_meta_extension_fields() {
        let snapshots = transform_meta_ads_json(RESPONSE).unwrap();
        let meta = snapshots[0].meta().unwrap();
        assert_eq!(meta.reach, 12_500);
        assert!((meta.frequency - 4.0).abs() < 1e-9);
        assert!((meta.engagement_rate - 1.0).abs() < 1e-9);
        assert_eq!(meta.video_views, 4000);
        assert!((meta.video_completion_rate - 20.0).abs() < 1e-9);
        assert_eq!(meta.quality_ranking, Ranking::BelowAverage);
        assert_eq!(meta.engagement_ranking, Ranking::AboveAverage);
        assert_eq!(meta.conversion_ranking, Ranking::Average);
    }

    #[test]
    fn test_video_completion_requires_both_actions() {
        let snapshots = transform_meta_ads_json(RESPONSE).unwrap();
        let meta = snapshots[1].meta().unwrap();
        assert_eq!(meta.video_views, 100);
        assert_eq!(meta.video_completion_rate, 0.0);
    }

    #[test]
    fn test_malformed_spend_parses_to_zero() {
        let snapshots = transform_meta_ads_json(RESPONSE).unwrap();
        let s = &snapshots[1];
        assert_eq!(s.cost, 0.0);
        assert_eq!(s.roas, 0.0);
        assert_eq!(s.conversions, 0.0);
    }
}
