//! Google Ads report rows → [`MetricsSnapshot`].

use crate::{lenient, ratio, ratio_pct};
use chrono::NaiveDate;
use mia_core::error::MiaResult;
use mia_core::types::{GoogleMetrics, MetricsSnapshot, PlatformExtension};
use serde::Deserialize;
use tracing::debug;

const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// Quality score assumed when a campaign has no keyword data.
pub const DEFAULT_QUALITY_SCORE: f64 = 7.0;

// ---------------------------------------------------------------------------
// Raw payload
// ---------------------------------------------------------------------------

/// Campaign report plus the keyword rows used for quality-score averaging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleAdsPayload {
    pub campaigns: Vec<GoogleCampaignRow>,
    pub keywords: Vec<GoogleKeywordRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCampaignRow {
    pub campaign: GoogleCampaign,
    #[serde(default)]
    pub metrics: GoogleRowMetrics,
    #[serde(default)]
    pub segments: Option<GoogleSegments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCampaign {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleSegments {
    #[serde(default)]
    pub date: Option<String>,
}

/// Metrics as returned by the API. Int64 fields arrive string-encoded and
/// impression shares as 0-1 fractions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleRowMetrics {
    #[serde(default, deserialize_with = "lenient::number")]
    pub impressions: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub clicks: f64,
    #[serde(default, alias = "costMicros", deserialize_with = "lenient::number")]
    pub cost_micros: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub conversions: f64,
    #[serde(default, alias = "conversionsValue", deserialize_with = "lenient::number")]
    pub conversions_value: f64,
    #[serde(default, alias = "searchImpressionShare", deserialize_with = "lenient::number")]
    pub search_impression_share: f64,
    #[serde(default, alias = "contentImpressionShare", deserialize_with = "lenient::number")]
    pub content_impression_share: f64,
    #[serde(
        default,
        alias = "searchBudgetLostImpressionShare",
        deserialize_with = "lenient::number"
    )]
    pub search_budget_lost_impression_share: f64,
    #[serde(
        default,
        alias = "searchRankLostImpressionShare",
        deserialize_with = "lenient::number"
    )]
    pub search_rank_lost_impression_share: f64,
    #[serde(default, alias = "topImpressionPercentage", deserialize_with = "lenient::number")]
    pub top_impression_percentage: f64,
    #[serde(
        default,
        alias = "absoluteTopImpressionPercentage",
        deserialize_with = "lenient::number"
    )]
    pub absolute_top_impression_percentage: f64,
    #[serde(default, alias = "averagePosition", deserialize_with = "lenient::number")]
    pub average_position: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleKeywordRow {
    #[serde(default, alias = "campaignId", deserialize_with = "lenient::string")]
    pub campaign_id: String,
    #[serde(default, alias = "qualityScore", deserialize_with = "lenient::optional_number")]
    pub quality_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Normalize every campaign row of a Google Ads report.
pub fn transform_google_ads_data(raw: &GoogleAdsPayload) -> Vec<MetricsSnapshot> {
    let snapshots: Vec<MetricsSnapshot> = raw
        .campaigns
        .iter()
        .map(|row| transform_row(row, &raw.keywords))
        .collect();

    debug!(
        campaigns = snapshots.len(),
        keywords = raw.keywords.len(),
        "Normalized Google Ads report"
    );
    snapshots
}

/// Parse a Google Ads JSON document and normalize it.
pub fn transform_google_ads_json(json: &str) -> MiaResult<Vec<MetricsSnapshot>> {
    let payload: GoogleAdsPayload = serde_json::from_str(json)?;
    Ok(transform_google_ads_data(&payload))
}

fn transform_row(row: &GoogleCampaignRow, keywords: &[GoogleKeywordRow]) -> MetricsSnapshot {
    let m = &row.metrics;
    let cost = m.cost_micros / MICROS_PER_UNIT;
    let conversion_value = m.conversions_value;
    let search_share = m.search_impression_share * 100.0;
    let impression_share = if search_share > 0.0 {
        search_share
    } else {
        m.content_impression_share * 100.0
    };

    let google = GoogleMetrics {
        quality_score: average_quality_score(&row.campaign.id, keywords),
        impression_share,
        search_impression_share: search_share,
        top_of_page_rate: m.top_impression_percentage * 100.0,
        absolute_top_rate: m.absolute_top_impression_percentage * 100.0,
        avg_position: m.average_position,
        budget_lost_is: m.search_budget_lost_impression_share * 100.0,
        rank_lost_is: m.search_rank_lost_impression_share * 100.0,
    };

    MetricsSnapshot {
        campaign_id: row.campaign.id.clone(),
        campaign_name: row.campaign.name.clone(),
        date: row
            .segments
            .as_ref()
            .and_then(|s| s.date.as_deref())
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        impressions: m.impressions as u64,
        clicks: m.clicks as u64,
        ctr: ratio_pct(m.clicks, m.impressions),
        cost,
        conversions: m.conversions,
        conversion_rate: ratio_pct(m.conversions, m.clicks),
        cpa: ratio(cost, m.conversions),
        roas: ratio(conversion_value, cost),
        conversion_value,
        extension: Some(PlatformExtension::Google(google)),
    }
}

/// Mean quality score over a campaign's keywords that report one.
fn average_quality_score(campaign_id: &str, keywords: &[GoogleKeywordRow]) -> f64 {
    let scores: Vec<f64> = keywords
        .iter()
        .filter(|k| k.campaign_id == campaign_id)
        .filter_map(|k| k.quality_score)
        .collect();

    if scores.is_empty() {
        DEFAULT_QUALITY_SCORE
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
