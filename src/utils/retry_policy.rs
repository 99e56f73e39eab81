// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RetrySettings;
use crate::domain::search::engine::SearchError;
use crate::infrastructure::observability::stats::StatsCollector;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（至少尝试一次）
    pub max_retries: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: false,
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.base_delay_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            enable_jitter: settings.jitter,
            ..Self::default()
        }
    }

    /// 计算第 `attempt` 次失败后的退避时间：`initial * multiplier^(attempt-1)`
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_secs = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        // 添加抖动
        let final_backoff = if self.enable_jitter && capped_backoff > 0.0 && self.jitter_factor > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 是否还能再尝试
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_retries.max(1)
    }
}

/// 重试执行器
///
/// 只重试 `EngineError` 与 `Timeout`，其他错误原样返回。
/// 用尽次数后返回 `RetriesExhausted`；给定截止时间时，
/// 单次尝试超过截止时间或下一次退避无法在截止前结束都会立即返回 `Timeout`。
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    stats: Option<Arc<StatsCollector>>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run<T, F, Fut>(&self, deadline: Option<Instant>, mut operation: F) -> Result<T, SearchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let outcome = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, operation())
                    .await
                    .unwrap_or(Err(SearchError::Timeout)),
                None => operation().await,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if !self.policy.should_retry(attempts) {
                return Err(SearchError::RetriesExhausted {
                    attempts,
                    last_error: Box::new(error),
                });
            }

            let backoff = self.policy.calculate_backoff(attempts);
            if let Some(deadline) = deadline {
                if Instant::now() + backoff >= deadline {
                    debug!("Backoff of {:?} would pass the deadline, giving up", backoff);
                    return Err(SearchError::Timeout);
                }
            }

            warn!(
                "Attempt {} failed: {}. Retrying in {:?}",
                attempts, error, backoff
            );
            if let Some(stats) = &self.stats {
                stats.record_retry();
            }
            tokio::time::sleep(backoff).await;
        }
    }
}
