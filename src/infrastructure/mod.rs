// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 缓存（cache）：按指纹去重的结果缓存
/// - 可观测性（observability）：统计计数与 Prometheus 导出
/// - 订阅源（rss）：抓取、解析、模板与排行
/// - 搜索（search）：多引擎编排与健康跟踪
pub mod cache;
pub mod observability;
pub mod rss;
pub mod search;
