// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::feed::FeedItem;
use crate::domain::models::search_result::SearchResultItem;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// 关键词权重的合法范围
pub const MIN_KEYWORD_WEIGHT: f64 = 1.0;
pub const MAX_KEYWORD_WEIGHT: f64 = 10.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RankingError {
    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),
    #[error("Invalid ranking request: {0}")]
    InvalidRequest(String),
}

/// 带权重的关键词
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordWeight {
    keyword: String,
    weight: f64,
}

impl KeywordWeight {
    /// 创建关键词权重，权重必须位于 [1.0, 10.0]
    pub fn new(keyword: impl Into<String>, weight: f64) -> Result<Self, RankingError> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return Err(RankingError::InvalidKeyword("keyword cannot be blank".into()));
        }
        if !(MIN_KEYWORD_WEIGHT..=MAX_KEYWORD_WEIGHT).contains(&weight) {
            return Err(RankingError::InvalidKeyword(format!(
                "weight {} for '{}' outside [{}, {}]",
                weight, keyword, MIN_KEYWORD_WEIGHT, MAX_KEYWORD_WEIGHT
            )));
        }
        Ok(Self { keyword, weight })
    }

    /// 批量转换 `(keyword, weight)` 对，保持顺序
    pub fn from_pairs<I, S>(pairs: I) -> Result<Vec<Self>, RankingError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        pairs.into_iter().map(|(k, w)| Self::new(k, w)).collect()
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// 可被关键词打分的条目
pub trait Rankable {
    /// 参与匹配的文本（标题加正文）
    fn rank_text(&self) -> String;
}

impl Rankable for SearchResultItem {
    fn rank_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

impl Rankable for FeedItem {
    fn rank_text(&self) -> String {
        let mut text = self.title.clone();
        for part in [&self.description, &self.content].into_iter().flatten() {
            text.push(' ');
            text.push_str(part);
        }
        text
    }
}

/// 打分后的条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem<T> {
    #[serde(flatten)]
    pub item: T,
    pub score: f64,
    pub matched_keywords: Vec<String>,
}

/// 订阅源排行结果
#[derive(Debug, Clone, Serialize)]
pub struct RankingResult {
    pub name: String,
    pub items: Vec<RankedItem<FeedItem>>,
    /// 打分前的条目总数
    pub total_items: usize,
    pub timestamp: DateTime<Utc>,
}
