//! Keyword intent router answering marketing questions from campaign
//! aggregates.

pub mod intent;
pub mod service;

pub use intent::{classify_intent, extract_entities, QueryEntities, QueryIntent};
pub use service::{ChatService, MarketingQuery};
