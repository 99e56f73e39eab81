// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::search_query::SearchQuery;
use crate::domain::models::search_result::SearchResultItem;
use crate::domain::search::engine::{EngineDescriptor, EngineFailure, SearchError};
use crate::domain::search::registry::EngineRegistry;
use crate::infrastructure::cache::result_cache::ResultCache;
use crate::infrastructure::observability::stats::{StatsCollector, StatsSnapshot};
use crate::infrastructure::search::engine_health::{EngineHealthTracker, HealthReport};
use crate::utils::retry_policy::{RetryExecutor, RetryPolicy};
use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 编排器配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 单个引擎（含重试）的超时时间
    pub engine_timeout: Duration,
    /// 结果缓存时间
    pub cache_ttl: Duration,
    /// 同时运行的引擎数上限，0 表示不限制
    pub max_concurrent_engines: usize,
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            engine_timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(300),
            max_concurrent_engines: 0,
            retry: RetryPolicy::standard(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            engine_timeout: settings.search.engine_timeout(),
            cache_ttl: settings.cache.ttl(),
            max_concurrent_engines: settings.search.max_concurrent_engines,
            retry: RetryPolicy::from_settings(&settings.retry),
        }
    }
}

/// 单次调用的选项
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// 整个调用的截止时间，约束本次调用对每个引擎的等待
    pub deadline: Option<Instant>,
    /// 跳过结果缓存直接请求引擎
    pub bypass_cache: bool,
    /// 不按 page_size 截断合并结果
    pub raw_merge: bool,
}

impl ExecuteOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::default()
        }
    }
}

type ResultList = Vec<SearchResultItem>;

/// 搜索编排器
///
/// 解析引擎集合后并发请求每个引擎；每个引擎独立经过缓存、重试和超时。
/// 单个引擎失败只记录统计，全部失败时返回 `AllEnginesFailed`。
/// 合并顺序是请求（或注册表默认）顺序，与完成顺序无关。
pub struct SearchOrchestrator {
    registry: Arc<EngineRegistry>,
    cache: ResultCache<ResultList, SearchError>,
    retry: RetryExecutor,
    stats: Arc<StatsCollector>,
    health: EngineHealthTracker,
    limiter: Option<Arc<Semaphore>>,
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    pub fn new(
        registry: Arc<EngineRegistry>,
        stats: Arc<StatsCollector>,
        config: OrchestratorConfig,
    ) -> Self {
        let limiter = (config.max_concurrent_engines > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_engines)));
        Self {
            registry,
            cache: ResultCache::new().with_stats(stats.clone()),
            retry: RetryExecutor::new(config.retry.clone()).with_stats(stats.clone()),
            stats,
            health: EngineHealthTracker::new(),
            limiter,
            config,
        }
    }

    pub async fn execute(&self, query: &SearchQuery) -> Result<ResultList, SearchError> {
        self.execute_with(query, ExecuteOptions::default()).await
    }

    pub async fn execute_with(
        &self,
        query: &SearchQuery,
        options: ExecuteOptions,
    ) -> Result<ResultList, SearchError> {
        let engines = self.registry.resolve(query)?;
        if engines.is_empty() {
            return Err(SearchError::InvalidQuery("no engines available".into()));
        }

        self.stats.record_search();
        info!(
            "Searching {} engines (page {}, page_size {})",
            engines.len(),
            query.page(),
            query.page_size()
        );
        debug!("Query text: {}", query.text());

        let outcomes = join_all(
            engines
                .iter()
                .map(|name| self.run_engine(name, query, &options)),
        )
        .await;

        let mut batches = Vec::with_capacity(engines.len());
        let mut failures = Vec::new();
        for (engine, outcome) in engines.into_iter().zip(outcomes) {
            match outcome {
                Ok(items) => batches.push(items),
                Err(error) => failures.push(EngineFailure { engine, error }),
            }
        }

        if batches.is_empty() {
            warn!("All {} engines failed", failures.len());
            return Err(SearchError::AllEnginesFailed(failures));
        }

        Ok(merge_results(batches, query.page_size(), options.raw_merge))
    }

    async fn run_engine(
        &self,
        name: &str,
        query: &SearchQuery,
        options: &ExecuteOptions,
    ) -> Result<ResultList, SearchError> {
        let started = Instant::now();
        let engine_deadline = started + self.config.engine_timeout;
        let deadline = match options.deadline {
            Some(call_deadline) => engine_deadline.min(call_deadline),
            None => engine_deadline,
        };

        let outcome = tokio::time::timeout_at(
            deadline,
            self.fetch(name, query, deadline, options.bypass_cache),
        )
        .await
        .unwrap_or(Err(SearchError::Timeout));

        match &outcome {
            Ok(items) => {
                debug!("Engine {} returned {} results", name, items.len());
                self.health.record_success(name, started.elapsed());
            }
            Err(e) => {
                let timed_out = e.is_timeout();
                if timed_out {
                    warn!("Engine {} timed out", name);
                    self.stats.record_timeout(name);
                } else {
                    warn!("Engine {} failed: {}", name, e);
                    self.stats.record_engine_failure(name);
                }
                self.health.record_failure(name, timed_out);
            }
        }
        outcome
    }

    /// 读取缓存或请求引擎
    ///
    /// 共享的计算只受引擎超时约束；调用方自己的截止时间只作用于它的等待
    /// （见 `run_engine`），加入他人计算的调用不会继承对方的截止时间。
    /// 并发上限只约束真正的引擎请求，缓存命中和加入进行中的计算不占名额。
    async fn fetch(
        &self,
        name: &str,
        query: &SearchQuery,
        deadline: Instant,
        bypass_cache: bool,
    ) -> Result<ResultList, SearchError> {
        if bypass_cache {
            return self.engine_call(name, query, Some(deadline))().await;
        }
        self.cache
            .get_or_compute(
                &query.fingerprint(name),
                self.config.cache_ttl,
                self.engine_call(name, query, None),
            )
            .await
    }

    fn engine_call(
        &self,
        name: &str,
        query: &SearchQuery,
        caller_deadline: Option<Instant>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<ResultList, SearchError>> + Send + 'static
    {
        let registry = self.registry.clone();
        let retry = self.retry.clone();
        let limiter = self.limiter.clone();
        let engine_timeout = self.config.engine_timeout;
        let engine_name = name.to_string();
        let text = query.text().to_string();
        let (page, page_size) = (query.page(), query.page_size());

        move || {
            async move {
                let engine_deadline = Instant::now() + engine_timeout;
                let deadline = caller_deadline.map_or(engine_deadline, |d| d.min(engine_deadline));
                let engine = registry.get(&engine_name)?;

                let _permit = match limiter {
                    Some(limiter) => Some(
                        limiter
                            .acquire_owned()
                            .await
                            .map_err(|e| SearchError::EngineError(e.to_string()))?,
                    ),
                    None => None,
                };

                retry
                    .run(Some(deadline), || {
                        let engine = engine.clone();
                        let text = text.clone();
                        async move { engine.search(&text, page, page_size).await }
                    })
                    .await
            }
            .boxed()
        }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn list_engines(&self) -> Vec<EngineDescriptor> {
        self.registry.list()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn stats_collector(&self) -> &Arc<StatsCollector> {
        &self.stats
    }

    pub fn health_check(&self) -> HealthReport {
        self.health.report(&self.registry.names())
    }

    /// 清空结果缓存（包括进行中的标记）
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Search result cache cleared");
    }

    /// 清理过期缓存条目
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }
}

/// 按引擎顺序合并，URL 相同的结果保留第一次出现的那条
pub fn merge_results(batches: Vec<ResultList>, page_size: u32, raw_merge: bool) -> ResultList {
    let mut seen = HashSet::new();
    let mut merged: ResultList = batches
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.url.clone()))
        .collect();
    if !raw_merge {
        merged.truncate(page_size as usize);
    }
    merged
}
