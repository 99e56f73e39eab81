// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::feed::{Feed, FeedItem, FeedMeta};
use crate::infrastructure::rss::fetcher::FeedError;
use crate::utils::text_encoding::decode_bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// 订阅源解析接口
pub trait FeedParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<Feed, FeedError>;
}

/// 需要提取文本的元素
const TEXT_TAGS: &[&str] = &[
    "title",
    "link",
    "description",
    "language",
    "author",
    "dc:creator",
    "pubDate",
    "dc:date",
    "guid",
    "category",
    "content:encoded",
    "subtitle",
    "summary",
    "content",
    "published",
    "updated",
    "id",
    "name",
];

static ELEMENT_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    TEXT_TAGS
        .iter()
        .map(|tag| {
            let escaped = regex::escape(tag);
            let pattern = format!(r"(?is)<{escaped}\b[^>]*?>(.*?)</{escaped}\s*>");
            (*tag, Regex::new(&pattern).expect("valid element regex"))
        })
        .collect()
});

static RSS_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item\s*>").expect("valid item regex"));
static ATOM_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<entry\b[^>]*>(.*?)</entry\s*>").expect("valid entry regex"));
static ATOM_AUTHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<author\b[^>]*>(.*?)</author\s*>").expect("valid author regex"));
static LINK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<link\b([^>]*?)/?>").expect("valid link regex"));
static CATEGORY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<category\b([^>]*?)/?>").expect("valid category regex"));
static FEED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<feed\b([^>]*)>").expect("valid feed regex"));
static CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid cdata regex"));

fn attribute_regex(name: &str) -> Regex {
    let pattern = format!(r#"(?i)(?:^|\s){}\s*=\s*["']([^"']*)["']"#, regex::escape(name));
    Regex::new(&pattern).expect("valid attribute regex")
}

static HREF_ATTR: Lazy<Regex> = Lazy::new(|| attribute_regex("href"));
static REL_ATTR: Lazy<Regex> = Lazy::new(|| attribute_regex("rel"));
static TERM_ATTR: Lazy<Regex> = Lazy::new(|| attribute_regex("term"));
static LANG_ATTR: Lazy<Regex> = Lazy::new(|| attribute_regex("xml:lang"));

/// 基于标签匹配的 RSS 2.0 / Atom 解析器
///
/// 不做完整 XML 校验，能容忍大多数格式不规范的订阅源
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFeedParser;

impl TagFeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, content: &str) -> Result<Feed, FeedError> {
        if content.contains("<rss") || content.contains("<rdf:RDF") || content.contains("<channel") {
            Ok(parse_rss(content))
        } else if content.contains("<feed") {
            Ok(parse_atom(content))
        } else {
            Err(FeedError::Parse("unknown feed format".into()))
        }
    }
}

impl FeedParser for TagFeedParser {
    fn parse(&self, raw: &[u8]) -> Result<Feed, FeedError> {
        self.parse_str(&decode_bytes(raw))
    }
}

fn parse_rss(content: &str) -> Feed {
    let items = RSS_ITEM
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| parse_rss_item(m.as_str()))
        .collect();

    // 第一个 item 之前的部分是 channel 信息
    let head = content.split("<item").next().unwrap_or(content);
    let meta = FeedMeta {
        title: element_text(head, "title").unwrap_or_default(),
        link: element_text(head, "link").unwrap_or_default(),
        description: element_text(head, "description").unwrap_or_default(),
        language: element_text(head, "language"),
    };

    Feed { meta, items }
}

fn parse_rss_item(block: &str) -> FeedItem {
    FeedItem {
        title: element_text(block, "title").unwrap_or_default(),
        link: element_text(block, "link").unwrap_or_default(),
        description: element_text(block, "description"),
        author: element_text(block, "author").or_else(|| element_text(block, "dc:creator")),
        pub_date: element_text(block, "pubDate").or_else(|| element_text(block, "dc:date")),
        content: element_text(block, "content:encoded"),
        categories: element_texts(block, "category"),
        guid: element_text(block, "guid"),
    }
}

fn parse_atom(content: &str) -> Feed {
    let items = ATOM_ENTRY
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| parse_atom_entry(m.as_str()))
        .collect();

    let head = content.split("<entry").next().unwrap_or(content);
    let language = FEED_TAG
        .captures(head)
        .and_then(|c| c.get(1))
        .and_then(|attrs| attribute(attrs.as_str(), &LANG_ATTR));
    let meta = FeedMeta {
        title: element_text(head, "title").unwrap_or_default(),
        link: atom_link(head).unwrap_or_default(),
        description: element_text(head, "subtitle").unwrap_or_default(),
        language,
    };

    Feed { meta, items }
}

fn parse_atom_entry(block: &str) -> FeedItem {
    let author = ATOM_AUTHOR
        .captures(block)
        .and_then(|c| c.get(1))
        .and_then(|m| element_text(m.as_str(), "name"));
    let categories = CATEGORY_TAG
        .captures_iter(block)
        .filter_map(|c| c.get(1))
        .filter_map(|attrs| attribute(attrs.as_str(), &TERM_ATTR))
        .collect();

    FeedItem {
        title: element_text(block, "title").unwrap_or_default(),
        link: atom_link(block).unwrap_or_default(),
        description: element_text(block, "summary"),
        author,
        pub_date: element_text(block, "published").or_else(|| element_text(block, "updated")),
        content: element_text(block, "content"),
        categories,
        guid: element_text(block, "id"),
    }
}

/// rel 缺省或为 alternate 的链接优先，否则取第一个
fn atom_link(block: &str) -> Option<String> {
    let links: Vec<(Option<String>, String)> = LINK_TAG
        .captures_iter(block)
        .filter_map(|c| c.get(1))
        .filter_map(|attrs| {
            let href = attribute(attrs.as_str(), &HREF_ATTR)?;
            Some((attribute(attrs.as_str(), &REL_ATTR), href))
        })
        .collect();

    links
        .iter()
        .find(|(rel, _)| match rel {
            Some(rel) => rel.eq_ignore_ascii_case("alternate"),
            None => true,
        })
        .or_else(|| links.first())
        .map(|(_, href)| href.clone())
}

fn element_text(block: &str, tag: &str) -> Option<String> {
    let raw = ELEMENT_PATTERNS.get(tag)?.captures(block)?.get(1)?.as_str();
    clean_text(raw)
}

fn element_texts(block: &str, tag: &str) -> Vec<String> {
    match ELEMENT_PATTERNS.get(tag) {
        Some(pattern) => pattern
            .captures_iter(block)
            .filter_map(|c| c.get(1))
            .filter_map(|m| clean_text(m.as_str()))
            .collect(),
        None => Vec::new(),
    }
}

fn attribute(attrs: &str, pattern: &Regex) -> Option<String> {
    let value = pattern.captures(attrs)?.get(1)?.as_str();
    clean_text(value)
}

/// 去掉 CDATA 包装并解码实体，空白内容视为不存在
fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let text = match CDATA.captures(trimmed) {
        Some(c) => c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
        None => html_escape::decode_html_entities(trimmed).into_owned(),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
