// intent-router - route retail assistant queries
// Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use intent_router::assistant::Assistant;
use intent_router::cli::{format_stats, format_summary, run_chat};
use intent_router::config::{load_config, load_config_from, BackendKind, RouterConfig};
use intent_router::logging::init_tracing;
use intent_router::metrics::DecisionLogger;
use intent_router::router::{IntentRouter, KeywordClassifier, RouterState};

#[derive(Parser)]
#[command(name = "intent-router")]
#[command(about = "Route shopping assistant queries to FAQ, product search or small talk", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $INTENT_ROUTER_CONFIG or ~/.intent-router/config.toml)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Embedding backend override (minilm or lexical)
    #[arg(long, value_name = "BACKEND", global = true)]
    backend: Option<BackendKind>,

    /// Similarity threshold override
    #[arg(long, value_name = "THRESHOLD", global = true)]
    threshold: Option<f32>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one or more queries
    Route {
        #[arg(value_name = "QUERY", required = true)]
        queries: Vec<String>,
        /// Output one JSON object per query
        #[arg(long)]
        json: bool,
    },
    /// Show how the keyword classifier scores a query (no model needed)
    Keywords {
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Load the embedding backend and run its self-test
    Warmup,
    /// Interactive chat with placeholder handlers
    Chat {
        /// Print the chosen route before each reply
        #[arg(long)]
        show_route: bool,
    },
    /// Summarize the decision log for a day
    Metrics {
        /// Day to summarize (YYYY-MM-DD, defaults to today in UTC)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(threshold) = cli.threshold {
        config.similarity_threshold = threshold;
        config.validate()?;
    }

    match cli.command {
        Commands::Keywords { query } => {
            let classifier = KeywordClassifier::builtin();
            let decision = classifier.decide(&query);
            println!("{} ({:?})", decision.route, decision.basis);
            for (route, hits) in &decision.hits {
                println!("  {:<15} {}", route.as_str(), hits);
            }
            if !decision.matched.is_empty() {
                println!("matched: {}", decision.matched.join(", "));
            }
            Ok(())
        }
        Commands::Route { queries, json } => route_queries(&config, &queries, json).await,
        Commands::Warmup => warm_up(&config).await,
        Commands::Chat { show_route } => chat(&config, show_route).await,
        Commands::Metrics { date } => show_metrics(&config, date),
    }
}

async fn route_queries(config: &RouterConfig, queries: &[String], json: bool) -> Result<()> {
    let router = IntentRouter::new(config)?;

    for query in queries {
        let decision = router.decide(query).await;
        if json {
            let line = serde_json::json!({
                "query": query,
                "route": decision.route,
                "method": decision.method,
                "score": decision.score,
                "fallback": decision.fallback,
            });
            println!("{}", line);
        } else {
            let score = decision
                .score
                .map(|s| format!(" score={:.3}", s))
                .unwrap_or_default();
            let fallback = decision
                .fallback
                .map(|f| format!(" fallback={}", f.as_str()))
                .unwrap_or_default();
            println!(
                "{}\t{} ({}{}{})",
                query,
                decision.route,
                decision.method.as_str(),
                score,
                fallback
            );
        }
    }

    Ok(())
}

async fn warm_up(config: &RouterConfig) -> Result<()> {
    let router = IntentRouter::new(config)?;
    let state = router.warm_up().await;
    match state {
        RouterState::Ready => {
            eprintln!("✓ {} backend ready", router.backend_name());
            Ok(())
        }
        _ => {
            let reason = router.degraded_reason().await.unwrap_or_default();
            anyhow::bail!("router is {}: {}", state.as_str(), reason)
        }
    }
}

async fn chat(config: &RouterConfig, show_route: bool) -> Result<()> {
    let router = Arc::new(IntentRouter::new(config)?);
    if config.warm_up_on_start {
        let state = router.warm_up().await;
        if state != RouterState::Ready {
            eprintln!("Warning: semantic routing unavailable, using keywords only");
        }
    }

    let assistant = Assistant::with_canned_handlers(router.clone());
    run_chat(&assistant, show_route).await?;

    eprintln!("{}", format_stats(&router.stats()));
    Ok(())
}

fn show_metrics(config: &RouterConfig, date: Option<String>) -> Result<()> {
    let dir = config
        .metrics_dir
        .clone()
        .context("Decision log is disabled; set metrics_dir in the config")?;
    let logger = DecisionLogger::new(dir)?;

    let summary = match date {
        Some(date) => logger.summary_for(&date)?,
        None => logger.today_summary()?,
    };
    println!("{}", format_summary(&summary));
    Ok(())
}
