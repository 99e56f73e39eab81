// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 带 TTL 和进行中请求合并的指纹缓存，搜索结果与 RSS 源共用
pub mod result_cache;
