// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub engine_failures: u64,
    pub timeouts: u64,
    /// 退避重试次数
    pub retries: u64,
}

/// 搜索统计收集器
///
/// 由调用方创建并注入编排器，计数器单调递增，只能通过 `reset` 清零。
/// 每次更新同时写入 `metrics` 门面，供 Prometheus 导出。
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    engine_failures: AtomicU64,
    timeouts: AtomicU64,
    retries: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("seesea_searches_total").increment(1);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("seesea_cache_hits_total").increment(1);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("seesea_cache_misses_total").increment(1);
    }

    pub fn record_engine_failure(&self, engine: &str) {
        self.engine_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("seesea_engine_failures_total", "engine" => engine.to_string())
            .increment(1);
    }

    pub fn record_timeout(&self, engine: &str) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("seesea_engine_timeouts_total", "engine" => engine.to_string())
            .increment(1);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("seesea_retries_total").increment(1);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_searches: self.total_searches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            engine_failures: self.engine_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_searches,
            &self.cache_hits,
            &self.cache_misses,
            &self.engine_failures,
            &self.timeouts,
            &self.retries,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
