// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// 连续失败达到该次数后视为不健康
const UNHEALTHY_THRESHOLD: u32 = 3;

/// 搜索引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineHealth {
    /// 健康
    #[default]
    Healthy,
    /// 降级（部分失败）
    Degraded,
    /// 不健康（连续失败）
    Unhealthy,
}

/// 搜索引擎指标
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineMetrics {
    /// 总请求数
    pub total_requests: u64,
    /// 成功请求数
    pub successful_requests: u64,
    /// 失败请求数（含超时）
    pub failed_requests: u64,
    /// 超时次数
    pub timeouts: u64,
    /// 连续失败次数
    pub consecutive_failures: u32,
    /// 成功请求的平均耗时（毫秒）
    pub avg_response_ms: f64,
    /// 健康状态
    pub health: EngineHealth,
}

impl EngineMetrics {
    /// 计算成功率
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }

    /// 记录请求成功
    pub fn record_success(&mut self, response_time: Duration) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.consecutive_failures = 0;

        // 更新平均响应时间
        let total = self.avg_response_ms * (self.successful_requests - 1) as f64;
        self.avg_response_ms =
            (total + response_time.as_secs_f64() * 1000.0) / self.successful_requests as f64;

        // 不健康的引擎先恢复到降级，再次成功才完全恢复
        self.health = match self.health {
            EngineHealth::Unhealthy => EngineHealth::Degraded,
            _ => EngineHealth::Healthy,
        };
    }

    /// 记录请求失败
    pub fn record_failure(&mut self, timed_out: bool) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.consecutive_failures += 1;
        if timed_out {
            self.timeouts += 1;
        }

        self.health = if self.consecutive_failures >= UNHEALTHY_THRESHOLD {
            EngineHealth::Unhealthy
        } else {
            EngineHealth::Degraded
        };
    }
}

/// 单个引擎的健康报告
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub name: String,
    pub health: EngineHealth,
    pub success_rate: f64,
    pub consecutive_failures: u32,
}

/// 健康检查结果
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: EngineHealth,
    pub engines: Vec<EngineStatus>,
}

impl HealthReport {
    /// 兼容 `(name, healthy)` 形式的简单视图
    pub fn as_pairs(&self) -> Vec<(String, bool)> {
        self.engines
            .iter()
            .map(|e| (e.name.clone(), e.health != EngineHealth::Unhealthy))
            .collect()
    }
}

/// 被动健康跟踪
///
/// 根据编排调用中的成功与失败更新每个引擎的状态，不主动探测
#[derive(Debug, Default)]
pub struct EngineHealthTracker {
    metrics: RwLock<HashMap<String, EngineMetrics>>,
}

impl EngineHealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, engine: &str, response_time: Duration) {
        self.metrics
            .write()
            .entry(engine.to_string())
            .or_default()
            .record_success(response_time);
    }

    pub fn record_failure(&self, engine: &str, timed_out: bool) {
        self.metrics
            .write()
            .entry(engine.to_string())
            .or_default()
            .record_failure(timed_out);
    }

    pub fn metrics(&self, engine: &str) -> EngineMetrics {
        self.metrics.read().get(engine).cloned().unwrap_or_default()
    }

    /// 生成给定引擎列表的健康报告
    ///
    /// 全部健康为 healthy，全部不健康（或没有引擎）为 unhealthy，其余为 degraded
    pub fn report(&self, engines: &[String]) -> HealthReport {
        let metrics = self.metrics.read();
        let engines: Vec<EngineStatus> = engines
            .iter()
            .map(|name| {
                let m = metrics.get(name).cloned().unwrap_or_default();
                EngineStatus {
                    name: name.clone(),
                    health: m.health,
                    success_rate: m.success_rate(),
                    consecutive_failures: m.consecutive_failures,
                }
            })
            .collect();

        let status = if engines.is_empty()
            || engines.iter().all(|e| e.health == EngineHealth::Unhealthy)
        {
            EngineHealth::Unhealthy
        } else if engines.iter().all(|e| e.health == EngineHealth::Healthy) {
            EngineHealth::Healthy
        } else {
            EngineHealth::Degraded
        };

        HealthReport { status, engines }
    }

    pub fn reset(&self) {
        self.metrics.write().clear();
    }
}
