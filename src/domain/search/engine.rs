// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_result::SearchResultItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 默认全局引擎集合的标签
pub const TAG_GLOBAL: &str = "global";
/// 中国模式默认引擎集合的标签
pub const TAG_CHINA: &str = "china";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),
    #[error("Engine already registered: {0}")]
    DuplicateEngine(String),
    #[error("Search engine error: {0}")]
    EngineError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<SearchError>,
    },
    #[error("All engines failed: {}", EngineFailure::join(.0))]
    AllEnginesFailed(Vec<EngineFailure>),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl SearchError {
    /// 可通过重试恢复的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::EngineError(_) | SearchError::Timeout)
    }

    /// 最终原因是否为超时（穿透 `RetriesExhausted`）
    pub fn is_timeout(&self) -> bool {
        match self {
            SearchError::Timeout => true,
            SearchError::RetriesExhausted { last_error, .. } => last_error.is_timeout(),
            _ => false,
        }
    }
}

/// 单个引擎在一次编排调用中的失败记录
#[derive(Debug, Clone, PartialEq)]
pub struct EngineFailure {
    pub engine: String,
    pub error: SearchError,
}

impl EngineFailure {
    fn join(failures: &[EngineFailure]) -> String {
        failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.engine, self.error)
    }
}

/// 引擎描述
///
/// 进程启动时注册，此后不可变。`tags` 既描述能力也决定默认集合归属。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl EngineDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// 浏览器驱动的搜索引擎
///
/// 每个实现对应一个站点。空结果是成功；只有导航或提取故障才返回错误。
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    fn descriptor(&self) -> &EngineDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Perform a search query
    async fn search(
        &self,
        query: &str,
        page: u32,
        max_results: u32,
    ) -> Result<Vec<SearchResultItem>, SearchError>;

    /// 清除引擎本地的页面缓存（与结果缓存无关）
    async fn clear_cache(&self) {}

    /// 打开持久会话，后续 `search` 复用该会话直到 `exit`
    async fn enter(&self) -> Result<(), SearchError> {
        Ok(())
    }

    /// 关闭 `enter` 打开的会话
    async fn exit(&self) -> Result<(), SearchError> {
        Ok(())
    }
}
