// Slash command handling for the chat loop

use anyhow::Result;

use crate::metrics::{DecisionSummary, StatsSnapshot};
use crate::router::{IntentRouter, Route, RoutingMethod};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Stats,
    Metrics,
    State,
    Keywords(String),
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input == "/keywords" {
            return Some(Command::Keywords(String::new()));
        }
        if let Some(rest) = input.strip_prefix("/keywords ") {
            return Some(Command::Keywords(rest.trim().to_string()));
        }
        match input {
            "/help" => Some(Command::Help),
            "/quit" | "/exit" => Some(Command::Quit),
            "/stats" => Some(Command::Stats),
            "/metrics" => Some(Command::Metrics),
            "/state" => Some(Command::State),
            _ => None,
        }
    }
}

pub async fn handle_command(command: &Command, router: &IntentRouter) -> Result<String> {
    match command {
        Command::Help => Ok(format_help()),
        Command::Quit => Ok("Goodbye!".to_string()),
        Command::Stats => Ok(format_stats(&router.stats())),
        Command::Metrics => match router.decision_log() {
            Some(logger) => match logger.today_summary() {
                Ok(summary) => Ok(format_summary(&summary)),
                Err(e) => Ok(format!("Failed to read decision log: {:#}", e)),
            },
            None => Ok("Decision log is disabled (set metrics_dir in the config).".to_string()),
        },
        Command::State => {
            let state = router.state().await;
            Ok(match router.degraded_reason().await {
                Some(reason) => format!("Router state: {} ({})", state.as_str(), reason),
                None => format!(
                    "Router state: {} (backend: {})",
                    state.as_str(),
                    router.backend_name()
                ),
            })
        }
        Command::Keywords(query) => Ok(format_keywords(router, query)),
    }
}

fn format_help() -> String {
    r#"Available commands:
  /help             - Show this help message
  /quit             - Exit the chat
  /stats            - Routing counters for this session
  /metrics          - Today's decision log summary
  /state            - Semantic layer state
  /keywords <query> - Show keyword hits for a query

Type any question to get started!"#
        .to_string()
}

fn pct(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

pub fn format_stats(stats: &StatsSnapshot) -> String {
    format!(
        "Routing stats (this session):\n\
        Total queries: {}\n\
        Semantic: {} ({:.1}%)\n\
        Keyword: {} ({:.1}%)\n\
        Default: {} ({:.1}%)\n\
          - Low confidence fallbacks: {}\n\
          - Error fallbacks: {}\n\
        Init attempts: {}\n\
        Degradations: {}\n",
        stats.total,
        stats.semantic,
        pct(stats.semantic, stats.total),
        stats.keyword,
        pct(stats.keyword, stats.total),
        stats.default,
        pct(stats.default, stats.total),
        stats.low_confidence_fallbacks,
        stats.error_fallbacks,
        stats.init_attempts,
        stats.degradations
    )
}

pub fn format_summary(summary: &DecisionSummary) -> String {
    let total = summary.total as u64;
    let mut output = format!(
        "Decisions today: {}\nAvg latency: {}us\nError fallbacks: {}\n",
        summary.total, summary.avg_latency_us, summary.error_fallbacks
    );

    output.push_str("\nBy route:\n");
    for route in Route::PRIORITY {
        let count = summary.by_route.get(&route).copied().unwrap_or(0) as u64;
        output.push_str(&format!(
            "  {:<15} {} ({:.1}%)\n",
            route.as_str(),
            count,
            pct(count, total)
        ));
    }

    output.push_str("\nBy method:\n");
    for method in [
        RoutingMethod::Semantic,
        RoutingMethod::Keyword,
        RoutingMethod::Default,
    ] {
        let count = summary.by_method.get(&method).copied().unwrap_or(0) as u64;
        output.push_str(&format!(
            "  {:<15} {} ({:.1}%)\n",
            method.as_str(),
            count,
            pct(count, total)
        ));
    }

    output
}

fn format_keywords(router: &IntentRouter, query: &str) -> String {
    let decision = router.keyword_classifier().decide(query);
    let mut output = format!(
        "Keyword route: {} ({:?})\n",
        decision.route, decision.basis
    );
    for (route, hits) in &decision.hits {
        output.push_str(&format!("  {:<15} {}\n", route.as_str(), hits));
    }
    if !decision.matched.is_empty() {
        output.push_str(&format!("Matched: {}\n", decision.matched.join(", ")));
    }
    output
}
