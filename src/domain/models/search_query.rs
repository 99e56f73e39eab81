// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::search::engine::SearchError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// 搜索查询
///
/// 通过 [`SearchQueryBuilder`] 构建，构建后不可变。
/// `engines` 为空时由 `china_mode` 决定使用哪个默认引擎集合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    text: String,
    page: u32,
    page_size: u32,
    language: Option<String>,
    region: Option<String>,
    engines: Vec<String>,
    china_mode: bool,
}

impl SearchQuery {
    pub fn builder(text: impl Into<String>) -> SearchQueryBuilder {
        SearchQueryBuilder::new(text)
    }

    /// 使用默认分页参数创建查询
    pub fn new(text: impl Into<String>) -> Result<Self, SearchError> {
        Self::builder(text).build()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn engines(&self) -> &[String] {
        &self.engines
    }

    pub fn china_mode(&self) -> bool {
        self.china_mode
    }

    /// 归一化后的查询文本（去除首尾空白并转小写）
    pub fn normalized_text(&self) -> String {
        self.text.trim().to_lowercase()
    }

    /// 计算某个引擎上的缓存指纹
    ///
    /// 指纹覆盖引擎名、归一化文本、页码、页大小、语言和地区，
    /// 以十六进制 SHA-256 表示
    pub fn fingerprint(&self, engine: &str) -> String {
        let mut hasher = Sha256::new();
        let text = self.normalized_text();
        let page = self.page.to_string();
        let page_size = self.page_size.to_string();
        let fields: [&str; 6] = [
            engine,
            &text,
            &page,
            &page_size,
            self.language.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or(""),
        ];
        for field in fields {
            hasher.update(field.as_bytes());
            // 字段分隔符，避免 ("ab","c") 与 ("a","bc") 冲突
            hasher.update([0x1f_u8]);
        }
        hex::encode(hasher.finalize())
    }
}

/// [`SearchQuery`] 构建器
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    text: String,
    page: u32,
    page_size: u32,
    language: Option<String>,
    region: Option<String>,
    engines: Vec<String>,
    china_mode: bool,
}

impl SearchQueryBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
            page_size: 10,
            language: None,
            region: None,
            engines: Vec::new(),
            china_mode: false,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn language(mut self, language: Option<impl Into<String>>) -> Self {
        self.language = language.map(Into::into);
        self
    }

    pub fn region(mut self, region: Option<impl Into<String>>) -> Self {
        self.region = region.map(Into::into);
        self
    }

    pub fn engine(mut self, name: impl Into<String>) -> Self {
        self.engines.push(name.into());
        self
    }

    pub fn engines<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn china_mode(mut self, china_mode: bool) -> Self {
        self.china_mode = china_mode;
        self
    }

    pub fn build(self) -> Result<SearchQuery, SearchError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(SearchError::InvalidQuery("query text cannot be empty".into()));
        }
        if self.page == 0 {
            return Err(SearchError::InvalidQuery("page must be >= 1".into()));
        }
        if self.page_size == 0 {
            return Err(SearchError::InvalidQuery("page_size must be >= 1".into()));
        }

        // 保持请求顺序去重，空白名称直接丢弃
        let mut engines: Vec<String> = Vec::with_capacity(self.engines.len());
        for name in self.engines {
            let name = name.trim().to_string();
            if !name.is_empty() && !engines.contains(&name) {
                engines.push(name);
            }
        }

        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(SearchQuery {
            text,
            page: self.page,
            page_size: self.page_size,
            language: non_blank(self.language),
            region: non_blank(self.region),
            engines,
            china_mode: self.china_mode,
        })
    }
}
