// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心数据结构，包括：
/// - 搜索查询（search_query）：不可变的查询及其缓存指纹
/// - 搜索结果（search_result）：引擎产生的单条结果
/// - 订阅源（feed）：RSS 条目、元信息、订阅与过滤查询
/// - 排行（ranking）：关键词权重、打分条目与排行结果
pub mod feed;
pub mod ranking;
pub mod search_query;
pub mod search_result;
