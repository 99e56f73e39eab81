// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use seesea::config::settings::RssSettings;
use seesea::domain::models::feed::FeedQuery;
use seesea::domain::models::ranking::KeywordWeight;
use seesea::infrastructure::rss::{
    FeedError, FeedTemplateStore, HttpFeedFetcher, RssFeedSource, TagFeedParser,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .enumerate()
        .map(|(i, (title, description))| {
            format!(
                "<item><title>{title}</title><link>https://news.example.com/{i}</link>\
                 <description>{description}</description></item>"
            )
        })
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>测试</title>{body}</channel></rss>"#)
}

async fn mount_feed(server: &MockServer, route: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml; charset=utf-8")
                .set_body_string(body),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn source() -> RssFeedSource {
    let settings = RssSettings {
        request_timeout_secs: 5,
        user_agent: "seesea-test".into(),
        template_dir: "templates/rss".into(),
    };
    RssFeedSource::new(
        Arc::new(HttpFeedFetcher::new(&settings).unwrap()),
        Arc::new(TagFeedParser::new()),
        Duration::from_secs(3600),
    )
}

fn keywords() -> Vec<KeywordWeight> {
    KeywordWeight::from_pairs([("人工智能", 8.0), ("机器学习", 6.0)]).unwrap()
}

#[tokio::test]
async fn test_ranking_across_feeds_skips_failures() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/tech.xml",
        rss(&[("A", "人工智能与机器学习的最新进展"), ("B", "今日天气晴朗")]),
        1,
    )
    .await;
    mount_feed(&server, "/ml.xml", rss(&[("C", "机器学习入门")]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/not-a-feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&server)
        .await;

    let urls: Vec<String> = ["/tech.xml", "/broken.xml", "/ml.xml", "/not-a-feed"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();

    let result = source()
        .create_ranking("科技", &urls, &keywords(), 3.0, 100)
        .await;

    assert_eq!(result.name, "科技");
    assert_eq!(result.total_items, 3);
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].item.title, "A");
    assert_eq!(result.items[0].score, 14.0);
    assert_eq!(result.items[0].matched_keywords, vec!["人工智能", "机器学习"]);
    assert_eq!(result.items[1].item.title, "C");
    assert_eq!(result.items[1].score, 6.0);
}

#[tokio::test]
async fn test_ranking_with_every_feed_failing_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let urls = vec![format!("{}/gone.xml", server.uri())];
    let result = source()
        .create_ranking("empty", &urls, &keywords(), 0.0, 100)
        .await;
    assert_eq!(result.total_items, 0);
    assert!(result.items.is_empty());
}

#[tokio::test]
async fn test_feed_fetch_is_cached() {
    let server = MockServer::start().await;
    mount_feed(&server, "/tech.xml", rss(&[("A", "人工智能")]), 1).await;

    let source = source();
    let url = format!("{}/tech.xml", server.uri());
    let (a, b) = tokio::join!(source.fetch(&url), source.fetch(&url));
    assert_eq!(a.unwrap(), b.unwrap());

    let again = source.fetch(&url).await.unwrap();
    assert_eq!(again.meta.title, "测试");
}

#[tokio::test]
async fn test_fetch_errors_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let source = source();
    let url = format!("{}/flaky.xml", server.uri());
    for _ in 0..2 {
        let err = source.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FeedError::Http { status: 503, .. }));
    }
}

#[tokio::test]
async fn test_fetch_query_filters_and_limits() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/mixed.xml",
        rss(&[
            ("Rust 1.90", "compiler"),
            ("Weather", "sunny"),
            ("tokio", "async rust runtime"),
            ("rustup", "toolchain"),
        ]),
        1,
    )
    .await;

    let query = FeedQuery {
        max_items: Some(2),
        filter_keywords: vec!["RUST".into()],
        ..FeedQuery::new(format!("{}/mixed.xml", server.uri()))
    };
    let feed = source().fetch_query(&query).await.unwrap();
    let titles: Vec<_> = feed.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Rust 1.90", "tokio"]);
}

#[tokio::test]
async fn test_add_from_template_prefetches_feeds() {
    let server = MockServer::start().await;
    mount_feed(&server, "/politics.xml", rss(&[("P", "时政")]), 1).await;
    mount_feed(&server, "/tech.xml", rss(&[("T", "人工智能")]), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let template = format!(
        r#"[meta]
name = "xinhua"
description = "新华网"

[feeds]
politics = "{uri}/politics.xml"
tech = "{uri}/tech.xml"
"#,
        uri = server.uri()
    );
    std::fs::write(dir.path().join("xinhua.rss.toml"), template).unwrap();
    let store = FeedTemplateStore::new(dir.path());

    let source = source();
    let subscriptions = source
        .add_from_template(&store, "xinhua", None)
        .await
        .unwrap();
    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[0].category, "politics");

    // 预抓取已经写入缓存，不会再次请求
    let feed = source.fetch(&subscriptions[1].url).await.unwrap();
    assert_eq!(feed.items[0].title, "T");
}
