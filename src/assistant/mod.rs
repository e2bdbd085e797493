// Assistant front door
//
// Routes a query and hands it to the handler registered for the route.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use crate::router::{IntentRouter, Route, RoutingDecision};

pub const EMPTY_QUERY_REPLY: &str =
    "Please ask me something! I can help with product searches, FAQs, or just chat.";
pub const HANDLER_ERROR_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// Downstream answerer for one route.
///
/// Implementations receive the user's query exactly as it was typed.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Handler that always returns the same reply. Used by the CLI chat
/// where the real FAQ/product/small-talk backends are not wired in.
pub struct CannedHandler {
    name: String,
    reply: String,
}

impl CannedHandler {
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
        }
    }

    /// Placeholder reply naming the route that would answer.
    pub fn for_route(route: Route) -> Self {
        let reply = match route {
            Route::Faq => "I'd look that up in the store FAQ.",
            Route::ProductSearch => "I'd search the product catalog for that.",
            Route::SmallTalk => "Happy to chat!",
        };
        Self::new(route.as_str(), reply)
    }
}

#[async_trait]
impl Handler for CannedHandler {
    async fn answer(&self, _query: &str) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct Assistant {
    router: Arc<IntentRouter>,
    faq: Arc<dyn Handler>,
    product_search: Arc<dyn Handler>,
    small_talk: Arc<dyn Handler>,
}

impl Assistant {
    pub fn new(
        router: Arc<IntentRouter>,
        faq: Arc<dyn Handler>,
        product_search: Arc<dyn Handler>,
        small_talk: Arc<dyn Handler>,
    ) -> Self {
        Self {
            router,
            faq,
            product_search,
            small_talk,
        }
    }

    /// Assistant whose handlers only name the route they stand in for.
    pub fn with_canned_handlers(router: Arc<IntentRouter>) -> Self {
        Self::new(
            router,
            Arc::new(CannedHandler::for_route(Route::Faq)),
            Arc::new(CannedHandler::for_route(Route::ProductSearch)),
            Arc::new(CannedHandler::for_route(Route::SmallTalk)),
        )
    }

    pub fn router(&self) -> &Arc<IntentRouter> {
        &self.router
    }

    pub fn handler_for(&self, route: Route) -> &Arc<dyn Handler> {
        match route {
            Route::Faq => &self.faq,
            Route::ProductSearch => &self.product_search,
            Route::SmallTalk => &self.small_talk,
        }
    }

    /// Route `query` and return the handler's answer unchanged.
    pub async fn dispatch(&self, query: &str) -> Result<String> {
        let route = self.router.route(query).await;
        let handler = self.handler_for(route);
        debug!("Dispatching to {} handler", handler.name());
        handler.answer(query).await
    }

    /// Chat entry point. Never fails: blank input gets a prompt and a
    /// handler error becomes an apology.
    pub async fn ask(&self, query: &str) -> String {
        self.respond(query).await.text
    }

    /// Like `ask`, also reporting how the query was routed.
    pub async fn respond(&self, query: &str) -> Reply {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Reply {
                decision: None,
                text: EMPTY_QUERY_REPLY.to_string(),
            };
        }

        let decision = self.router.decide(trimmed).await;
        let handler = self.handler_for(decision.route);
        debug!("Dispatching to {} handler", handler.name());

        let text = match handler.answer(query).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("{} handler failed: {:#}", handler.name(), e);
                HANDLER_ERROR_REPLY.to_string()
            }
        };

        Reply {
            decision: Some(decision),
            text,
        }
    }
}

/// Answer to a chat query
#[derive(Debug, Clone)]
pub struct Reply {
    /// `None` when the query was blank and nothing was routed
    pub decision: Option<RoutingDecision>,
    pub text: String,
}
