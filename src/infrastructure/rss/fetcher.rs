// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RssSettings;
use crate::domain::models::ranking::RankingError;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 订阅源相关错误
///
/// 需要 `Clone`：同一订阅源的并发抓取共享一次结果
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedError {
    #[error("Feed fetch failed: {0}")]
    Fetch(String),

    #[error("Feed request to {url} returned HTTP {status}")]
    Http { status: u16, url: String },

    #[error("Feed request timed out: {0}")]
    Timeout(String),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Ranking(#[from] RankingError),
}

/// 订阅源抓取接口
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// 返回响应体原始字节，非 2xx 状态视为错误
    async fn fetch(&self, url: &str) -> Result<Bytes, FeedError>;
}

/// 基于 reqwest 的抓取实现
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(settings: &RssSettings) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| FeedError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// 使用外部构建的客户端
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        if e.is_timeout() {
            FeedError::Timeout(url)
        } else if let Some(status) = e.status() {
            FeedError::Http {
                status: status.as_u16(),
                url,
            }
        } else {
            FeedError::Fetch(e.to_string())
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FeedError> {
        debug!("Fetching feed {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        debug!("Fetched feed {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
