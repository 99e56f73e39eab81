// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用层
///
/// 请求 DTO 与对外的客户端入口
pub mod dto;
pub mod use_cases;
