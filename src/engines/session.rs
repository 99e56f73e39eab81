// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::search::engine::SearchError;
use crate::engines::traits::{BrowserAction, BrowserSession, RenderedPage};
use tracing::warn;

/// 临时会话守卫
///
/// 正常路径调用 `release` 关闭会话；提前返回、出错或 future 被取消时，
/// `Drop` 会在当前运行时上异步关闭会话。
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub async fn open(&mut self, url: &str, actions: &[BrowserAction]) -> Result<RenderedPage, SearchError> {
        match self.session.as_mut() {
            Some(session) => session.open(url, actions).await,
            None => Err(SearchError::EngineError("browser session already released".into())),
        }
    }

    /// 显式关闭会话
    pub async fn release(mut self) -> Result<(), SearchError> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!("Failed to close abandoned browser session: {}", e);
                    }
                });
            }
            Err(_) => warn!("Browser session dropped outside of a runtime; resources leak until exit"),
        }
    }
}
