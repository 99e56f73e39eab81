// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 搜索领域模块
///
/// 定义浏览器引擎能力接口、错误分类和引擎注册表
pub mod engine;
pub mod registry;
