// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 浏览器自动化后端接口、会话守卫、站点配置与站点引擎
pub mod chromium_backend;
pub mod profiles;
pub mod session;
pub mod site_engine;
pub mod traits;
