// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：查询、结果、订阅源和排行数据结构
/// - 搜索（search）：引擎契约与注册表
/// - 服务（services）：关键词排行
///
/// 领域层不依赖任何外部实现。
pub mod models;
pub mod search;
pub mod services;
