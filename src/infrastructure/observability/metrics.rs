// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 未启用时直接返回；启用后安装 Prometheus 导出器并注册计数器描述
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if a recorder is already installed (tests, repeated init)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    describe_counter!("seesea_searches_total", "Total number of orchestrated searches");
    describe_counter!("seesea_cache_hits_total", "Result cache hits, including joined in-flight fetches");
    describe_counter!("seesea_cache_misses_total", "Result cache misses");
    describe_counter!(
        "seesea_engine_failures_total",
        "Engine calls that failed for a reason other than timeout"
    );
    describe_counter!("seesea_engine_timeouts_total", "Engine calls that timed out");
    describe_counter!("seesea_retries_total", "Backoff retries performed");
    describe_counter!("seesea_feed_failures_total", "Feed fetches skipped because of errors");

    info!("Metrics exporter listening on {}", addr);
}
