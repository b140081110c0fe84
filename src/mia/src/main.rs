//! MIA, the marketing insight engine CLI.
//!
//! Loads configuration and JSON inputs, runs the normalizer, insight engine,
//! analytics or chat router, and prints JSON to stdout. Logs go to stderr.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use mia_analytics::AnalyticsService;
use mia_chat::ChatService;
use mia_core::config::AppConfig;
use mia_core::types::{Campaign, InsightContext};
use mia_insights::{rank_by_priority, InsightEngine};
use mia_integrations::{transform_google_ads_json, transform_meta_ads_json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mia")]
#[command(about = "Marketing insight engine for Google Ads and Meta Ads campaigns")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// ROAS target (overrides config)
    #[arg(long, global = true, env = "MIA_ROAS_TARGET")]
    roas_target: Option<f64>,

    /// Minimum spend before a campaign is evaluated (overrides config)
    #[arg(long, global = true, env = "MIA_MINIMUM_SPEND")]
    minimum_spend: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize a raw platform report into metrics snapshots
    Normalize {
        #[arg(long, value_enum)]
        platform: SourcePlatform,

        /// Raw API response (JSON)
        #[arg(long)]
        input: PathBuf,
    },

    /// Run the insight engine over one context or an array of contexts
    Analyze {
        #[arg(long)]
        context: PathBuf,
    },

    /// Aggregate campaigns per platform
    Platforms {
        #[arg(long)]
        campaigns: PathBuf,
    },

    /// Campaign-level performance insights
    Insights {
        #[arg(long)]
        campaigns: PathBuf,
    },

    /// Interpolated daily trend
    Trends {
        #[arg(long)]
        campaigns: PathBuf,

        #[arg(long, default_value = "7")]
        days: u32,

        /// Last day of the series (default: today)
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },

    /// Ask a free-text question about the campaigns
    Ask {
        #[arg(long)]
        campaigns: PathBuf,

        #[arg(long, default_value = "cli")]
        user: String,

        question: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourcePlatform {
    Google,
    Meta,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mia=info,mia_insights=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(target) = cli.roas_target {
        config.rules.roas_target = target;
    }
    if let Some(spend) = cli.minimum_spend {
        config.rules.minimum_spend = spend;
    }

    match cli.command {
        Commands::Normalize { platform, input } => {
            let raw = read_to_string(&input)?;
            let snapshots = match platform {
                SourcePlatform::Google => transform_google_ads_json(&raw)?,
                SourcePlatform::Meta => transform_meta_ads_json(&raw)?,
            };
            info!(platform = ?platform, snapshots = snapshots.len(), "Normalized report");
            print_json(&snapshots)
        }
        Commands::Analyze { context } => {
            let raw = read_to_string(&context)?;
            let contexts = parse_contexts(&raw)
                .with_context(|| format!("parsing {}", context.display()))?;
            let engine = InsightEngine::try_new(config.rules)?;
            let ranked = rank_by_priority(engine.analyze_portfolio(&contexts));
            info!(contexts = contexts.len(), insights = ranked.len(), "Analysis complete");
            print_json(&ranked)
        }
        Commands::Platforms { campaigns } => {
            let campaigns: Vec<Campaign> = read_json(&campaigns)?;
            let service = AnalyticsService::new(config.analytics);
            print_json(&service.calculate_platform_metrics(&campaigns))
        }
        Commands::Insights { campaigns } => {
            let campaigns: Vec<Campaign> = read_json(&campaigns)?;
            let service = AnalyticsService::new(config.analytics);
            print_json(&service.generate_insights(&campaigns))
        }
        Commands::Trends {
            campaigns,
            days,
            end_date,
        } => {
            let campaigns: Vec<Campaign> = read_json(&campaigns)?;
            let service = AnalyticsService::new(config.analytics);
            let end_date = end_date.unwrap_or_else(|| Utc::now().date_naive());
            print_json(&service.calculate_trends(&campaigns, days, end_date))
        }
        Commands::Ask {
            campaigns,
            user,
            question,
        } => {
            let campaigns: Vec<Campaign> = read_json(&campaigns)?;
            let chat = ChatService::new(campaigns, config.analytics);
            print_json(&chat.process_query(&question, &user))
        }
    }
}

/// An explicit `--config` must load. Without one, a broken environment
/// layer falls back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        })),
    }
}

/// Accepts one context object or an array of them.
fn parse_contexts(raw: &str) -> anyhow::Result<Vec<InsightContext>> {
    let value: serde_json::Value = serde_json::from_str(raw).context("invalid JSON")?;
    if value.is_array() {
        serde_json::from_value(value).context("invalid insight context array")
    } else {
        let context: InsightContext =
            serde_json::from_value(value).context("invalid insight context")?;
        Ok(vec![context])
    }
}

fn read_to_string(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = read_to_string(path)?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
