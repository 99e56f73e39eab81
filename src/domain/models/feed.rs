// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 订阅源元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: Option<String>,
}

/// 订阅源条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub author: Option<String>,
    /// 原始发布时间字符串（RFC 2822 或 RFC 3339）
    pub pub_date: Option<String>,
    pub content: Option<String>,
    pub categories: Vec<String>,
    pub guid: Option<String>,
}

impl FeedItem {
    /// 解析发布时间，无法识别的格式返回 `None`
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.pub_date.as_deref()?.trim();
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

/// 解析后的订阅源
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub meta: FeedMeta,
    pub items: Vec<FeedItem>,
}

/// 订阅（由模板和分类选择生成，持久化由外部负责）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSubscription {
    pub name: String,
    pub url: String,
    pub category: String,
}

/// 带过滤条件的订阅源查询
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub url: String,
    /// 最多返回的条目数
    pub max_items: Option<usize>,
    /// 标题或描述包含任一关键词（忽略大小写）的条目才保留
    pub filter_keywords: Vec<String>,
    /// 只保留此时间之后发布的条目，无法解析发布时间的条目被丢弃
    pub after_date: Option<DateTime<Utc>>,
}

impl FeedQuery {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 对已解析的订阅源应用过滤条件
    pub fn apply(&self, mut feed: Feed) -> Feed {
        let keywords: Vec<String> = self
            .filter_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        feed.items.retain(|item| {
            if let Some(after) = self.after_date {
                match item.published_at() {
                    Some(published) if published > after => {}
                    _ => return false,
                }
            }
            if keywords.is_empty() {
                return true;
            }
            let title = item.title.to_lowercase();
            let description = item.description.as_deref().unwrap_or("").to_lowercase();
            keywords
                .iter()
                .any(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
        });

        if let Some(max) = self.max_items {
            feed.items.truncate(max);
        }
        feed
    }
}
