// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{xinhua_results_html, MockBackend};
use seesea::application::dto::search_request::SearchRequestDto;
use seesea::domain::models::ranking::RankingError;
use seesea::domain::models::search_query::SearchQuery;
use seesea::{FeedError, SearchError, SeeSeaClient, Settings};
use std::sync::Arc;

fn client(backend: MockBackend) -> SeeSeaClient {
    let settings = Settings::from_defaults().unwrap();
    SeeSeaClient::with_backend(&settings, Arc::new(backend)).unwrap()
}

#[tokio::test]
async fn test_builtin_engine_sets() {
    let client = client(MockBackend::new(""));

    let names: Vec<_> = client.list_engines().into_iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        vec!["xinhua", "baidu", "bing", "sogou", "so360", "yandex", "duckduckgo"]
    );
    assert_eq!(client.list_global_engines(), vec!["bing", "yandex", "duckduckgo"]);
    assert_eq!(
        client.list_china_engines(),
        vec!["xinhua", "baidu", "bing", "sogou", "so360"]
    );
}

#[tokio::test]
async fn test_seven_parameter_search() {
    let backend = MockBackend::new(xinhua_results_html(5));
    let client = client(backend.clone());
    let engines = vec!["xinhua".to_string()];

    let results = client
        .search("人工智能", 1, 10, Some("zh"), Some("cn"), Some(&engines), false)
        .await
        .unwrap();
    assert_eq!(results.len(), 5);

    let again = client
        .search("人工智能", 1, 10, Some("zh"), Some("cn"), Some(&engines), false)
        .await
        .unwrap();
    assert_eq!(results, again);

    let stats = client.stats();
    assert_eq!(stats.total_searches, 2);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(backend.navigations().len(), 1);

    client.clear_cache();
    client
        .search("人工智能", 1, 10, Some("zh"), Some("cn"), Some(&engines), false)
        .await
        .unwrap();
    assert_eq!(backend.navigations().len(), 2);
}

#[tokio::test]
async fn test_search_request_dto_forces_refresh() {
    let backend = MockBackend::new(xinhua_results_html(2));
    let client = client(backend.clone());

    let mut request = SearchRequestDto::new("人工智能");
    request.engines = vec!["xinhua".into()];
    let response = client.search_request(&request).await.unwrap();
    assert_eq!(response.total, 2);
    assert_eq!(response.query, "人工智能");

    request.force = true;
    client.search_request(&request).await.unwrap();
    assert_eq!(backend.navigations().len(), 2);
}

#[tokio::test]
async fn test_invalid_search_input() {
    let client = client(MockBackend::new(""));

    let err = client
        .search("   ", 1, 10, None, None, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));

    let err = client
        .search("rust", 0, 10, None, None, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));
    assert_eq!(client.stats().total_searches, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_backend_degrades_engine() {
    let client = client(MockBackend::failing());
    let engines = vec!["duckduckgo".to_string()];

    let err = client
        .search("rust", 1, 10, None, None, Some(&engines), false)
        .await;
    assert!(matches!(err, Err(SearchError::AllEnginesFailed(_))));

    let report = client.health_check();
    let ddg = report
        .engines
        .iter()
        .find(|e| e.name == "duckduckgo")
        .unwrap();
    assert_eq!(ddg.consecutive_failures, 1);
    assert_eq!(client.stats().engine_failures, 1);
}

#[tokio::test]
async fn test_ranking_rejects_bad_keyword_weight() {
    let client = client(MockBackend::new(""));
    let err = client
        .create_ranking(
            &["https://example.com/rss".to_string()],
            &[("人工智能".to_string(), 12.0)],
            0.0,
            100,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FeedError::Ranking(RankingError::InvalidKeyword(_))
    ));
}

#[tokio::test]
async fn test_templates_from_configured_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tech.rss.toml"),
        "[meta]\nname = \"tech\"\ndescription = \"科技\"\n\n[feeds]\nai = \"https://example.com/ai.xml\"\n",
    )
    .unwrap();

    let mut settings = Settings::from_defaults().unwrap();
    settings.rss.template_dir = dir.path().to_string_lossy().into_owned();
    let client = SeeSeaClient::with_backend(&settings, Arc::new(MockBackend::new(""))).unwrap();

    assert_eq!(client.list_templates().unwrap(), vec!["tech"]);
    let subs = client.subscriptions_from_template("tech", None).unwrap();
    assert_eq!(subs[0].url, "https://example.com/ai.xml");
}

#[tokio::test]
async fn test_search_ranked_sets_scores() {
    let client = client(MockBackend::new(xinhua_results_html(5)));
    let query = SearchQuery::builder("人工智能")
        .engines(["xinhua"])
        .build()
        .unwrap();

    let ranked = client
        .search_ranked(&query, &[("新闻 3".to_string(), 5.0)], 1.0)
        .await
        .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].url, "https://www.news.cn/tech/3.htm");
    assert_eq!(ranked[0].score, 5.0);

    let err = client
        .search_ranked(&query, &[("新闻".to_string(), 50.0)], 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));
}
