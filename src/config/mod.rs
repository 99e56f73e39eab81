// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理搜索、缓存、重试、浏览器、RSS、日志和指标配置
pub mod settings;
