// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 可观测性模块
///
/// 提供注入式的搜索统计收集器和 Prometheus 指标导出
pub mod metrics;
pub mod stats;
