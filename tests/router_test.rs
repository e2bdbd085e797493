// Integration tests for the router orchestrator

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{
    lexical_config, router_with, FaultyEngine, FlakyLoader, RecordingSleeper, SequenceLoader,
    SCENARIOS,
};
use intent_router::config::RouterConfig;
use intent_router::embeddings::{EmbeddingEngine, LexicalEmbedding, LexicalLoader};
use intent_router::router::{
    FallbackReason, IntentRouter, KeywordClassifier, Route, RouterState, RoutingMethod,
    TokioSleeper,
};

#[tokio::test]
async fn test_scenarios_agree_under_both_classifiers() {
    let keywords = KeywordClassifier::builtin();
    let router = router_with(
        Arc::new(LexicalLoader::new()),
        Arc::new(RecordingSleeper::default()),
    );

    for (query, expected) in SCENARIOS {
        assert_eq!(keywords.classify(query), *expected, "keyword: {}", query);
        assert_eq!(router.route(query).await, *expected, "router: {}", query);
    }
    assert_eq!(router.state().await, RouterState::Ready);
}

#[tokio::test]
async fn test_gibberish_falls_back_through_digit_heuristic() {
    let router = router_with(
        Arc::new(LexicalLoader::new()),
        Arc::new(RecordingSleeper::default()),
    );

    let decision = router.decide("asdkjashdkjh random gibberish 12345").await;
    assert_eq!(decision.route, Route::ProductSearch);
    assert_eq!(decision.method, RoutingMethod::Default);
    assert_eq!(decision.fallback, Some(FallbackReason::LowConfidence));
    assert!(decision.score.is_none());
}

#[tokio::test]
async fn test_semantic_decision_reports_score() {
    let router = router_with(
        Arc::new(LexicalLoader::new()),
        Arc::new(RecordingSleeper::default()),
    );

    let decision = router.decide("How can I track my order?").await;
    assert_eq!(decision.route, Route::Faq);
    assert_eq!(decision.method, RoutingMethod::Semantic);
    assert!(decision.fallback.is_none());
    assert!(decision.score.unwrap() >= 0.3);
}

#[tokio::test]
async fn test_failing_backend_matches_keyword_classifier() {
    let keywords = KeywordClassifier::builtin();
    let router = router_with(
        Arc::new(FlakyLoader::always_failing()),
        Arc::new(RecordingSleeper::default()),
    );

    let queries = [
        "What is your policy on defective product?",
        "Pink Puma shoes in price range 1000 to 5000",
        "How are you?",
        "asdkjashdkjh random gibberish 12345",
        "Do I get discount with the HDFC credit card?",
        "tell me a joke",
        "qwerty zxcvb",
        "",
    ];
    for query in queries {
        assert_eq!(router.route(query).await, keywords.classify(query), "{:?}", query);
    }
    assert_eq!(router.state().await, RouterState::Degraded);
}

#[tokio::test]
async fn test_retry_recovers_on_third_attempt() {
    let loader = Arc::new(FlakyLoader::lexical(2));
    let sleeper = Arc::new(RecordingSleeper::default());
    let router = router_with(loader.clone(), sleeper.clone());

    assert_eq!(router.warm_up().await, RouterState::Ready);
    assert_eq!(loader.calls(), 3);
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_secs(1), Duration::from_secs(1)]
    );

    let decision = router.decide("How are you?").await;
    assert_eq!(decision.method, RoutingMethod::Semantic);
    assert_eq!(decision.route, Route::SmallTalk);
    assert_eq!(router.stats().init_attempts, 3);
}

#[tokio::test]
async fn test_exhausted_retries_stay_degraded_until_reinitialize() {
    let loader = Arc::new(FlakyLoader::lexical(3));
    let router = router_with(loader.clone(), Arc::new(RecordingSleeper::default()));

    let decision = router.decide("How are you?").await;
    assert_eq!(decision.fallback, Some(FallbackReason::Degraded));
    assert_eq!(decision.route, Route::SmallTalk);
    assert_eq!(router.state().await, RouterState::Degraded);

    router.route("Pink Puma shoes").await;
    assert_eq!(loader.calls(), 3, "degraded router must not retry on its own");

    assert_eq!(router.reinitialize().await, RouterState::Ready);
    assert_eq!(loader.calls(), 4);
    assert_eq!(
        router.decide("How are you?").await.method,
        RoutingMethod::Semantic
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_initialize_once() {
    let loader = Arc::new(FlakyLoader::lexical(0));
    let router = Arc::new(router_with(
        loader.clone(),
        Arc::new(RecordingSleeper::default()),
    ));

    let mut handles = Vec::new();
    for (query, _) in SCENARIOS.iter().cycle().take(16) {
        let router = router.clone();
        handles.push(tokio::spawn(async move { router.route(query).await }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(loader.calls(), 1);
    assert_eq!(router.stats().total, 16);
    assert_eq!(router.state().await, RouterState::Ready);
}

#[tokio::test]
async fn test_encoding_error_falls_back_without_degrading() {
    let engine = Arc::new(FaultyEngine::new(Duration::ZERO));
    let router = router_with(
        Arc::new(FlakyLoader::new(0, engine)),
        Arc::new(RecordingSleeper::default()),
    );

    let decision = router.decide("[boom] nike shoes").await;
    assert_eq!(decision.route, Route::ProductSearch);
    assert_eq!(decision.method, RoutingMethod::Keyword);
    assert_eq!(decision.fallback, Some(FallbackReason::EncodingError));
    assert_eq!(router.state().await, RouterState::Ready);

    assert_eq!(
        router.decide("How are you?").await.method,
        RoutingMethod::Semantic
    );
    assert_eq!(router.stats().error_fallbacks, 1);
}

#[tokio::test]
async fn test_encode_timeout_degrades() {
    let engine = Arc::new(FaultyEngine::new(Duration::from_millis(400)));
    let config = RouterConfig {
        encode_timeout_ms: 50,
        ..lexical_config()
    };
    let router = IntentRouter::with_loader(&config, Arc::new(FlakyLoader::new(0, engine.clone())))
        .unwrap()
        .with_sleeper(Arc::new(RecordingSleeper::default()));

    assert_eq!(router.warm_up().await, RouterState::Ready);
    engine.stall.store(true, Ordering::SeqCst);

    let decision = router.decide("What is your policy on defective product?").await;
    assert_eq!(decision.route, Route::Faq);
    assert_eq!(decision.fallback, Some(FallbackReason::Timeout));
    assert_eq!(router.state().await, RouterState::Degraded);

    // later queries skip the semantic layer entirely
    let decision = router.decide("How are you?").await;
    assert_eq!(decision.fallback, Some(FallbackReason::Degraded));
    assert_eq!(router.stats().degradations, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_failure_from_replaced_layer_keeps_new_layer() {
    let stalling = Arc::new(FaultyEngine::new(Duration::from_millis(600)));
    let engines: Vec<Arc<dyn EmbeddingEngine>> =
        vec![stalling.clone(), Arc::new(LexicalEmbedding::new())];
    let loader = SequenceLoader::new(engines);
    let config = RouterConfig {
        encode_timeout_ms: 300,
        ..lexical_config()
    };
    let router = Arc::new(
        IntentRouter::with_loader(&config, Arc::new(loader))
            .unwrap()
            .with_sleeper(Arc::new(RecordingSleeper::default())),
    );

    assert_eq!(router.warm_up().await, RouterState::Ready);
    stalling.stall.store(true, Ordering::SeqCst);

    let in_flight = {
        let router = router.clone();
        tokio::spawn(async move { router.decide("How are you?").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(router.reinitialize().await, RouterState::Ready);

    let stale = in_flight.await.unwrap();
    assert_eq!(stale.fallback, Some(FallbackReason::Timeout));
    assert_eq!(stale.route, Route::SmallTalk);

    // the timeout belonged to the old engine; the new one stays live
    assert_eq!(router.state().await, RouterState::Ready);
    assert_eq!(router.stats().degradations, 0);
    assert_eq!(
        router.decide("How are you?").await.method,
        RoutingMethod::Semantic
    );
}

#[tokio::test]
async fn test_routes_are_stable_across_repeated_calls() {
    let semantic = router_with(
        Arc::new(LexicalLoader::new()),
        Arc::new(RecordingSleeper::default()),
    );
    let degraded = router_with(
        Arc::new(FlakyLoader::always_failing()),
        Arc::new(RecordingSleeper::default()),
    );

    for (query, expected) in SCENARIOS {
        let first = semantic.decide(query).await;
        assert_eq!(first.route, *expected);
        for _ in 0..5 {
            let again = semantic.decide(query).await;
            assert_eq!(again.route, first.route, "{}", query);
            assert_eq!(again.method, first.method, "{}", query);
            assert_eq!(again.score, first.score, "{}", query);

            assert_eq!(degraded.route(query).await, *expected, "{}", query);
        }
    }
}

#[tokio::test]
async fn test_panicking_backend_degrades() {
    let engine = Arc::new(FaultyEngine::new(Duration::ZERO));
    let router = router_with(
        Arc::new(FlakyLoader::new(0, engine)),
        Arc::new(RecordingSleeper::default()),
    );

    let decision = router.decide("[panic] how are you").await;
    assert_eq!(decision.fallback, Some(FallbackReason::BackendFailure));
    assert_eq!(decision.route, Route::SmallTalk);
    assert_eq!(router.state().await, RouterState::Degraded);
}

#[tokio::test]
async fn test_dimension_mismatch_degrades() {
    let engine = Arc::new(FaultyEngine::new(Duration::ZERO));
    let router = router_with(
        Arc::new(FlakyLoader::new(0, engine)),
        Arc::new(RecordingSleeper::default()),
    );

    let decision = router.decide("[mismatch] adidas shoes").await;
    assert_eq!(decision.route, Route::ProductSearch);
    assert_eq!(decision.fallback, Some(FallbackReason::BackendFailure));
    assert!(router
        .degraded_reason()
        .await
        .unwrap()
        .contains("dimension"));
}

#[tokio::test]
async fn test_shutdown_keeps_routing() {
    let router = router_with(
        Arc::new(LexicalLoader::new()),
        Arc::new(RecordingSleeper::default()),
    );
    router.warm_up().await;
    router.shutdown().await;

    assert_eq!(router.state().await, RouterState::Degraded);
    for (query, expected) in SCENARIOS {
        assert_eq!(router.route(query).await, *expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts() {
    let router = IntentRouter::with_loader(
        &lexical_config(),
        Arc::new(FlakyLoader::always_failing()),
    )
    .unwrap()
    .with_sleeper(Arc::new(TokioSleeper));

    let started = tokio::time::Instant::now();
    assert_eq!(router.warm_up().await, RouterState::Degraded);

    // three attempts, two one-second backoffs, no sleep after the last
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_decisions_are_logged_without_raw_queries() {
    let dir = tempfile::tempdir().unwrap();
    let config = RouterConfig {
        metrics_dir: Some(dir.path().join("metrics")),
        ..lexical_config()
    };
    let router = IntentRouter::with_loader(&config, Arc::new(LexicalLoader::new()))
        .unwrap()
        .with_sleeper(Arc::new(RecordingSleeper::default()));

    router.route("How are you?").await;
    router.route("asdkjashdkjh random gibberish 12345").await;

    let logger = router.decision_log().unwrap();
    let summary = logger.today_summary().unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.by_method[&RoutingMethod::Semantic], 1);
    assert_eq!(summary.by_method[&RoutingMethod::Default], 1);

    for entry in std::fs::read_dir(dir.path().join("metrics")).unwrap() {
        let contents = std::fs::read_to_string(entry.unwrap().path()).unwrap();
        assert!(!contents.contains("gibberish"));
    }
}
