//! Ad-platform normalizers turning raw Google Ads and Meta Ads API payloads
//! into unified [`MetricsSnapshot`](mia_core::types::MetricsSnapshot) records.

pub mod google_ads;
mod lenient;
pub mod meta_ads;

pub use google_ads::{transform_google_ads_data, transform_google_ads_json, GoogleAdsPayload};
pub use meta_ads::{transform_meta_ads_data, transform_meta_ads_json, MetaAdsPayload};

pub(crate) fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
