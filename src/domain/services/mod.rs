// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 纯计算的领域服务，目前包含关键词加权排序
pub mod ranking_engine;
