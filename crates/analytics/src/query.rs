//! Filter, ranking and trend types used by [`crate::AnalyticsService`].

use chrono::{DateTime, NaiveDate, Utc};
use mia_core::error::MiaError;
use mia_core::types::{Campaign, CampaignStatus, Platform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive range over campaign start dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Conjunctive campaign filter. Empty lists and a missing range place no
/// constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignFilter {
    pub platforms: Vec<Platform>,
    pub date_range: Option<DateRange>,
    pub campaign_ids: Vec<String>,
    pub statuses: Vec<CampaignStatus>,
}

impl CampaignFilter {
    pub fn matches(&self, campaign: &Campaign) -> bool {
        (self.platforms.is_empty() || self.platforms.contains(&campaign.platform))
            && self
                .date_range
                .map_or(true, |range| range.contains(campaign.start_date))
            && (self.campaign_ids.is_empty() || self.campaign_ids.contains(&campaign.id))
            && (self.statuses.is_empty() || self.statuses.contains(&campaign.status))
    }
}

/// Numeric campaign field used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignMetric {
    Spend,
    Budget,
    Impressions,
    Clicks,
    Conversions,
    Ctr,
    Cpa,
    Roas,
}

impl CampaignMetric {
    pub fn value(&self, campaign: &Campaign) -> f64 {
        match self {
            CampaignMetric::Spend => campaign.spend,
            CampaignMetric::Budget => campaign.budget,
            CampaignMetric::Impressions => campaign.impressions as f64,
            CampaignMetric::Clicks => campaign.clicks as f64,
            CampaignMetric::Conversions => campaign.conversions as f64,
            CampaignMetric::Ctr => campaign.ctr,
            CampaignMetric::Cpa => campaign.cpa,
            CampaignMetric::Roas => campaign.roas,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignMetric::Spend => "spend",
            CampaignMetric::Budget => "budget",
            CampaignMetric::Impressions => "impressions",
            CampaignMetric::Clicks => "clicks",
            CampaignMetric::Conversions => "conversions",
            CampaignMetric::Ctr => "ctr",
            CampaignMetric::Cpa => "cpa",
            CampaignMetric::Roas => "roas",
        }
    }
}

impl fmt::Display for CampaignMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignMetric {
    type Err = MiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spend" | "cost" => Ok(CampaignMetric::Spend),
            "budget" => Ok(CampaignMetric::Budget),
            "impressions" => Ok(CampaignMetric::Impressions),
            "clicks" => Ok(CampaignMetric::Clicks),
            "conversions" => Ok(CampaignMetric::Conversions),
            "ctr" => Ok(CampaignMetric::Ctr),
            "cpa" => Ok(CampaignMetric::Cpa),
            "roas" => Ok(CampaignMetric::Roas),
            other => Err(MiaError::Validation(format!("unknown campaign metric: {other}"))),
        }
    }
}

/// One interpolated day of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub ctr: f64,
    pub cpa: f64,
}
