// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LoggingSettings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 安装全局 tracing 订阅者
///
/// RUST_LOG 优先于配置中的过滤器；重复调用时保留已安装的订阅者
pub fn init_telemetry(settings: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(settings.json.then(|| fmt::layer().json()))
        .with((!settings.json).then(fmt::layer))
        .try_init();
}
