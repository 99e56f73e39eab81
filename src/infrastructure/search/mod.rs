// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 搜索编排模块
///
/// 并发扇出、逐引擎缓存/重试/超时、结果合并以及被动健康跟踪
pub mod engine_health;
pub mod orchestrator;

pub use engine_health::{EngineHealth, EngineHealthTracker, HealthReport};
pub use orchestrator::{ExecuteOptions, OrchestratorConfig, SearchOrchestrator};
