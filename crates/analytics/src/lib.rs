//! Campaign-level analytics: per-platform aggregation, coarse performance
//! insights, filtering, ranking and trend interpolation.

pub mod query;
pub mod service;

pub use query::{CampaignFilter, CampaignMetric, DateRange, TrendPoint};
pub use service::{AnalyticsService, PlatformMetrics};
