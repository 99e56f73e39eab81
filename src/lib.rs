// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 请求 DTO 与 `SeeSeaClient` 入口
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、引擎契约和排行服务
pub mod domain;

/// 引擎模块
///
/// 浏览器驱动的站点搜索引擎与 Chromium 后端
pub mod engines;

/// 基础设施模块
///
/// 缓存、编排、订阅源和统计
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

pub use application::use_cases::SeeSeaClient;
pub use config::settings::Settings;
pub use domain::search::engine::SearchError;
pub use infrastructure::rss::FeedError;
