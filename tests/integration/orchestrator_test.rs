// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{orchestrator, test_config, xinhua_results_html, MockBackend, MockEngine};
use seesea::domain::models::search_query::SearchQuery;
use seesea::domain::models::search_result::SearchResultItem;
use seesea::domain::search::engine::{SearchError, TAG_CHINA, TAG_GLOBAL};
use seesea::domain::search::registry::EngineRegistry;
use seesea::engines::profiles::builtin_profiles;
use seesea::engines::site_engine::SiteEngine;
use seesea::infrastructure::search::engine_health::EngineHealth;
use seesea::infrastructure::search::orchestrator::ExecuteOptions;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn query(engines: &[&str]) -> SearchQuery {
    SearchQuery::builder("人工智能")
        .engines(engines.iter().copied())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_xinhua_search_then_cache_hit() {
    let backend = MockBackend::new(xinhua_results_html(5));
    let profile = builtin_profiles()
        .into_iter()
        .find(|p| p.name == "xinhua")
        .unwrap();
    let registry = EngineRegistry::new();
    registry
        .register(profile.descriptor(), SiteEngine::factory(profile, Arc::new(backend.clone())))
        .unwrap();
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let q = SearchQuery::builder("人工智能")
        .page_size(5)
        .engines(["xinhua"])
        .build()
        .unwrap();
    let first = orchestrator.execute(&q).await.unwrap();
    assert_eq!(first.len(), 5);
    assert!(first.iter().all(|item| item.engine == "xinhua"));
    assert_eq!(first[0].title, "人工智能新闻 1");
    assert_eq!(first[0].url, "https://www.news.cn/tech/1.htm");
    assert_eq!(first[0].content, "摘要 1");

    let second = orchestrator.execute(&q).await.unwrap();
    assert_eq!(first, second);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_searches, 2);
    assert_eq!(snapshot.cache_misses, 1);
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(backend.navigations().len(), 1);
    // 临时会话在每次搜索后关闭
    assert_eq!(backend.opened(), backend.closed());
}

#[tokio::test(start_paused = true)]
async fn test_all_engines_fail() {
    let registry = EngineRegistry::new();
    let a = MockEngine::new("a", &[TAG_GLOBAL], 3).always_failing();
    let b = MockEngine::new("b", &[TAG_GLOBAL], 3).always_failing();
    let (a_calls, b_calls) = (a.calls(), b.calls());
    a.register(&registry);
    b.register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let err = orchestrator.execute(&query(&[])).await.unwrap_err();
    let SearchError::AllEnginesFailed(failures) = err else {
        panic!("expected AllEnginesFailed");
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].engine, "a");
    assert_eq!(failures[1].engine, "b");
    assert!(matches!(
        failures[0].error,
        SearchError::RetriesExhausted { attempts: 3, .. }
    ));

    assert_eq!(a_calls.load(Ordering::SeqCst), 3);
    assert_eq!(b_calls.load(Ordering::SeqCst), 3);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_searches, 1);
    assert_eq!(snapshot.engine_failures, 2);
    assert_eq!(snapshot.timeouts, 0);
    assert_eq!(snapshot.retries, 4);
    assert_eq!(snapshot.cache_misses, 2);
}

#[tokio::test(start_paused = true)]
async fn test_partial_failure_counts_each_failed_engine() {
    let registry = EngineRegistry::new();
    MockEngine::new("ok", &[TAG_GLOBAL], 2).register(&registry);
    MockEngine::new("broken", &[TAG_GLOBAL], 2)
        .always_failing()
        .register(&registry);
    MockEngine::new("slow", &[TAG_GLOBAL], 2)
        .with_latency(Duration::from_secs(30))
        .register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(5)));

    let results = orchestrator.execute(&query(&[])).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|item| item.engine == "ok"));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_searches, 1);
    assert_eq!(snapshot.engine_failures + snapshot.timeouts, 2);
    assert_eq!(snapshot.timeouts, 1);

    let report = orchestrator.health_check();
    assert_eq!(report.status, EngineHealth::Degraded);
    let health = |name: &str| {
        report
            .engines
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.health)
            .unwrap()
    };
    assert_eq!(health("ok"), EngineHealth::Healthy);
    assert_eq!(health("broken"), EngineHealth::Degraded);
    assert_eq!(health("slow"), EngineHealth::Degraded);
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_success() {
    let registry = EngineRegistry::new();
    let flaky = MockEngine::new("flaky", &[TAG_GLOBAL], 4).failing_first(2);
    let calls = flaky.calls();
    flaky.register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let started = Instant::now();
    let results = orchestrator.execute(&query(&["flaky"])).await.unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 100ms + 200ms 退避
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(400));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.retries, 2);
    assert_eq!(snapshot.engine_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_call_deadline_bounds_every_engine() {
    let registry = EngineRegistry::new();
    MockEngine::new("slow", &[TAG_GLOBAL], 1)
        .with_latency(Duration::from_secs(10))
        .register(&registry);
    MockEngine::new("slower", &[TAG_GLOBAL], 1)
        .with_latency(Duration::from_secs(20))
        .register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let started = Instant::now();
    let err = orchestrator
        .execute_with(&query(&[]), ExecuteOptions::with_timeout(Duration::from_millis(500)))
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_millis(600));

    let SearchError::AllEnginesFailed(failures) = err else {
        panic!("expected AllEnginesFailed");
    };
    assert!(failures.iter().all(|f| f.error.is_timeout()));
    assert_eq!(stats.snapshot().timeouts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_queries_share_one_call() {
    let registry = EngineRegistry::new();
    let engine = MockEngine::new("bing", &[TAG_GLOBAL], 3).with_latency(Duration::from_millis(50));
    let calls = engine.calls();
    engine.register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let q = query(&["bing"]);
    let (a, b) = tokio::join!(orchestrator.execute(&q), orchestrator.execute(&q));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_searches, 2);
    assert_eq!(snapshot.cache_misses, 1);
    assert_eq!(snapshot.cache_hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_merge_follows_engine_order_not_completion_order() {
    let shared = SearchResultItem::new("shared", "https://shared.example.com", "", "a");
    let registry = EngineRegistry::new();
    MockEngine::new("a", &[TAG_GLOBAL], 0)
        .with_items(vec![
            SearchResultItem::new("a1", "https://a.example.com/1", "", "a"),
            shared.clone(),
        ])
        .with_latency(Duration::from_millis(200))
        .register(&registry);
    MockEngine::new("b", &[TAG_GLOBAL], 0)
        .with_items(vec![
            SearchResultItem { engine: "b".into(), ..shared },
            SearchResultItem::new("b1", "https://b.example.com/1", "", "b"),
        ])
        .register(&registry);
    let (orchestrator, _) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let results = orchestrator.execute(&query(&["a", "b"])).await.unwrap();
    let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["a1", "shared", "b1"]);
    assert_eq!(results[1].engine, "a");
}

#[tokio::test]
async fn test_china_mode_selects_china_default_set() {
    let registry = EngineRegistry::new();
    let global = MockEngine::new("global-only", &[TAG_GLOBAL], 1);
    let china = MockEngine::new("china-only", &[TAG_CHINA], 1);
    let both = MockEngine::new("both", &[TAG_GLOBAL, TAG_CHINA], 1);
    let global_calls = global.calls();
    global.register(&registry);
    china.register(&registry);
    both.register(&registry);
    let (orchestrator, _) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let q = SearchQuery::builder("新闻").china_mode(true).build().unwrap();
    let results = orchestrator.execute(&q).await.unwrap();
    let engines: Vec<_> = results.iter().map(|r| r.engine.as_str()).collect();
    assert_eq!(engines, vec!["china-only", "both"]);
    assert_eq!(global_calls.load(Ordering::SeqCst), 0);

    let results = orchestrator.execute(&query(&[])).await.unwrap();
    let engines: Vec<_> = results.iter().map(|r| r.engine.as_str()).collect();
    assert_eq!(engines, vec!["global-only", "both"]);
}

#[tokio::test]
async fn test_unknown_engine_rejected_before_fan_out() {
    let registry = EngineRegistry::new();
    let bing = MockEngine::new("bing", &[TAG_GLOBAL], 1);
    let calls = bing.calls();
    bing.register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let err = orchestrator
        .execute(&query(&["bing", "nope"]))
        .await
        .unwrap_err();
    assert_eq!(err, SearchError::UnknownEngine("nope".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(stats.snapshot().total_searches, 0);
}

#[tokio::test]
async fn test_empty_default_set_is_invalid_query() {
    let registry = EngineRegistry::new();
    MockEngine::new("china-only", &[TAG_CHINA], 1).register(&registry);
    let (orchestrator, _) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let err = orchestrator.execute(&query(&[])).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));
}

#[tokio::test]
async fn test_bypass_and_clear_cache() {
    let registry = EngineRegistry::new();
    let engine = MockEngine::new("bing", &[TAG_GLOBAL], 1);
    let calls = engine.calls();
    engine.register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let q = query(&["bing"]);
    orchestrator.execute(&q).await.unwrap();
    let bypass = ExecuteOptions {
        bypass_cache: true,
        ..ExecuteOptions::default()
    };
    orchestrator.execute_with(&q, bypass).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    orchestrator.clear_cache();
    orchestrator.execute(&q).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 清空缓存不会重置统计
    assert_eq!(stats.snapshot().total_searches, 3);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_serializes_engines() {
    let registry = EngineRegistry::new();
    for name in ["a", "b"] {
        MockEngine::new(name, &[TAG_GLOBAL], 1)
            .with_latency(Duration::from_millis(100))
            .register(&registry);
    }
    let mut config = test_config(3, Duration::from_secs(15));
    config.max_concurrent_engines = 1;
    let (orchestrator, _) = orchestrator(registry, config);

    let started = Instant::now();
    let results = orchestrator.execute(&query(&[])).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_joined_call_keeps_its_own_deadline() {
    let registry = EngineRegistry::new();
    let engine = MockEngine::new("bing", &[TAG_GLOBAL], 2).with_latency(Duration::from_secs(1));
    let calls = engine.calls();
    engine.register(&registry);
    let (orchestrator, stats) = orchestrator(registry, test_config(3, Duration::from_secs(15)));

    let q = query(&["bing"]);
    let (impatient, patient) = tokio::join!(
        orchestrator.execute_with(&q, ExecuteOptions::with_timeout(Duration::from_millis(100))),
        orchestrator.execute(&q)
    );

    let Err(SearchError::AllEnginesFailed(failures)) = impatient else {
        panic!("expected the short call to time out");
    };
    assert!(failures[0].error.is_timeout());
    assert_eq!(patient.unwrap().len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_searches, 2);
    assert_eq!(snapshot.cache_misses, 1);
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(snapshot.timeouts, 1);
    assert_eq!(snapshot.engine_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_does_not_wait_for_engine_slot() {
    let registry = EngineRegistry::new();
    MockEngine::new("fast", &[TAG_GLOBAL], 1).register(&registry);
    MockEngine::new("slow", &[TAG_GLOBAL], 1)
        .with_latency(Duration::from_secs(10))
        .register(&registry);
    let mut config = test_config(3, Duration::from_secs(15));
    config.max_concurrent_engines = 1;
    let (orchestrator, stats) = orchestrator(registry, config);

    orchestrator.execute(&query(&["fast"])).await.unwrap();

    let cached = async {
        // slow 先拿到唯一的名额
        tokio::time::sleep(Duration::from_millis(10)).await;
        let started = Instant::now();
        let results = orchestrator
            .execute_with(&query(&["fast"]), ExecuteOptions::with_timeout(Duration::from_secs(1)))
            .await;
        (results, started.elapsed())
    };
    let slow_query = query(&["slow"]);
    let (slow, (fast, waited)) = tokio::join!(orchestrator.execute(&slow_query), cached);

    assert_eq!(slow.unwrap().len(), 1);
    assert_eq!(fast.unwrap().len(), 1);
    assert!(waited < Duration::from_millis(100));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(snapshot.cache_misses, 2);
    assert_eq!(snapshot.timeouts, 0);
}
