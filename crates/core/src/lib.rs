pub mod config;
pub mod error;
pub mod types;

pub use config::{AnalyticsConfig, AppConfig, InsightRules};
pub use error::{MiaError, MiaResult};
