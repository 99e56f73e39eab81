// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 单条搜索结果
///
/// 由引擎产生，写入缓存后不再修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
    /// 摘要
    pub content: String,
    pub score: f64,
    /// 产生该结果的引擎名称
    pub engine: String,
}

impl SearchResultItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        engine: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            score: 0.0,
            engine: engine.into(),
        }
    }
}
