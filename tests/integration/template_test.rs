// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use seesea::infrastructure::rss::{FeedError, FeedTemplateStore};

const XINHUA: &str = r#"
[meta]
name = "xinhua"
description = "新华网订阅源"
language = "zh-CN"
provider = "新华网"
update_interval = 1800

[feeds]
politics = "http://www.news.cn/politics/news_politics.xml"
tech = "http://www.news.cn/tech/news_tech.xml"
world = "http://www.news.cn/world/news_world.xml"
"#;

fn store_with_templates() -> (tempfile::TempDir, FeedTemplateStore) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("xinhua.rss.toml"), XINHUA).unwrap();
    std::fs::write(
        dir.path().join("people.rss.toml"),
        "[meta]\nname = \"people\"\ndescription = \"人民网\"\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    let store = FeedTemplateStore::new(dir.path());
    (dir, store)
}

#[test]
fn test_list_templates_sorted() {
    let (_dir, store) = store_with_templates();
    assert_eq!(store.list_templates().unwrap(), vec!["people", "xinhua"]);
}

#[test]
fn test_load_template_meta() {
    let (_dir, store) = store_with_templates();
    let template = store.load_template("xinhua").unwrap();

    assert_eq!(template.meta.provider.as_deref(), Some("新华网"));
    assert_eq!(template.meta.update_interval, 1800);
    assert!(template.meta.persistent);
    assert_eq!(template.feeds.len(), 3);

    let people = store.load_template("people").unwrap();
    assert!(people.feeds.is_empty());
}

#[test]
fn test_subscriptions_for_selected_categories() {
    let (_dir, store) = store_with_templates();

    let all = store.subscriptions_from_template("xinhua", None).unwrap();
    let categories: Vec<_> = all.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(categories, vec!["politics", "tech", "world"]);

    let wanted = vec!["world".to_string(), "tech".to_string()];
    let some = store
        .subscriptions_from_template("xinhua", Some(&wanted))
        .unwrap();
    assert_eq!(some.len(), 2);
    assert_eq!(some[0].name, "xinhua-tech");
    assert_eq!(some[1].url, "http://www.news.cn/world/news_world.xml");
}

#[test]
fn test_missing_template() {
    let (_dir, store) = store_with_templates();
    let err = store.subscriptions_from_template("nope", None).unwrap_err();
    assert!(matches!(err, FeedError::Template(_)));
}
