// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_query::SearchQuery;
use crate::domain::models::search_result::SearchResultItem;
use crate::domain::search::engine::SearchError;
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// 搜索请求（供外层包装使用）
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SearchRequestDto {
    #[validate(length(min = 1, max = 512, message = "Query cannot be empty"))]
    pub query: String,
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    pub language: Option<String>,
    pub region: Option<String>,
    /// 指定引擎，为空时使用默认集合
    #[serde(default, alias = "sources")]
    pub engines: Vec<String>,
    #[serde(default)]
    pub china_mode: bool,
    /// 跳过结果缓存
    #[serde(default)]
    pub force: bool,
}

impl SearchRequestDto {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: default_page(),
            page_size: default_page_size(),
            language: None,
            region: None,
            engines: Vec::new(),
            china_mode: false,
            force: false,
        }
    }

    /// 校验并转换为领域查询
    pub fn to_query(&self) -> Result<SearchQuery, SearchError> {
        self.validate()
            .map_err(|e| SearchError::InvalidQuery(e.to_string()))?;
        SearchQuery::builder(self.query.as_str())
            .page(self.page)
            .page_size(self.page_size)
            .language(self.language.as_deref())
            .region(self.region.as_deref())
            .engines(self.engines.iter().map(String::as_str))
            .china_mode(self.china_mode)
            .build()
    }
}

/// 搜索响应
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponseDto {
    pub query: String,
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
    pub results: Vec<SearchResultItem>,
}

impl SearchResponseDto {
    pub fn new(query: &SearchQuery, results: Vec<SearchResultItem>) -> Self {
        Self {
            query: query.text().to_string(),
            page: query.page(),
            page_size: query.page_size(),
            total: results.len(),
            results,
        }
    }
}
