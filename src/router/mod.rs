// Router module
// Public interface for routing decisions

mod corpus;
mod decision;
mod keyword;
mod orchestrator;
mod retry;
mod semantic;

pub use corpus::{Corpus, UtteranceExample};
pub use decision::{FallbackReason, Route, RoutingDecision, RoutingMethod};
pub use keyword::{KeywordBasis, KeywordClassifier, KeywordDecision, KeywordTable};
pub use orchestrator::{IntentRouter, RouterState};
pub use retry::{with_retry, RetryExhausted, RetryPolicy, Sleeper, TokioSleeper};
pub use semantic::{SemanticClassifier, SemanticOutcome, DEFAULT_THRESHOLD};
