// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_result::SearchResultItem;
use crate::domain::search::engine::{BrowserEngine, EngineDescriptor, SearchError};
use crate::domain::search::registry::{EngineFactory, EngineRegistry};
use crate::engines::profiles::{builtin_profiles, SiteProfile};
use crate::engines::session::SessionGuard;
use crate::engines::traits::{BrowserAction, BrowserBackend, BrowserSession, RenderedPage};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 由 [`SiteProfile`] 驱动的浏览器引擎
///
/// 未调用 `enter` 时每次搜索打开临时会话并在所有路径上关闭；
/// `enter` 之后复用同一会话，会话访问由异步互斥锁串行化。
pub struct SiteEngine {
    descriptor: EngineDescriptor,
    profile: Arc<SiteProfile>,
    backend: Arc<dyn BrowserBackend>,
    session: Mutex<Option<Box<dyn BrowserSession>>>,
    /// 引擎本地的页面结果缓存，键为请求 URL
    page_cache: DashMap<String, Vec<SearchResultItem>>,
}

impl SiteEngine {
    pub fn new(profile: Arc<SiteProfile>, backend: Arc<dyn BrowserBackend>) -> Self {
        Self {
            descriptor: profile.descriptor(),
            profile,
            backend,
            session: Mutex::new(None),
            page_cache: DashMap::new(),
        }
    }

    /// 注册表使用的工厂，每次调用返回新实例
    pub fn factory(profile: SiteProfile, backend: Arc<dyn BrowserBackend>) -> EngineFactory {
        let profile = Arc::new(profile);
        Arc::new(move || {
            Arc::new(SiteEngine::new(profile.clone(), backend.clone())) as Arc<dyn BrowserEngine>
        })
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    async fn render(&self, url: &str, actions: &[BrowserAction]) -> Result<RenderedPage, SearchError> {
        {
            let mut persistent = self.session.lock().await;
            if let Some(session) = persistent.as_mut() {
                return session.open(url, actions).await;
            }
        }

        let mut guard = SessionGuard::new(self.backend.open_session().await?);
        let page = guard.open(url, actions).await;
        if let Err(e) = guard.release().await {
            warn!("[{}] Failed to close browser session: {}", self.descriptor.name, e);
        }
        page
    }
}

#[async_trait]
impl BrowserEngine for SiteEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        max_results: u32,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        let url = self.profile.build_url(query, page, max_results);

        let cached = self.page_cache.get(&url).map(|entry| entry.value().clone());
        if let Some(items) = cached {
            debug!("[{}] Page cache hit for {}", self.descriptor.name, url);
            return Ok(items);
        }

        debug!("[{}] Navigating to {}", self.descriptor.name, url);
        let rendered = self.render(&url, &self.profile.action_sequence()).await?;
        let items = self.profile.extract(&rendered, max_results)?;
        debug!("[{}] Extracted {} results", self.descriptor.name, items.len());

        self.page_cache.insert(url, items.clone());
        Ok(items)
    }

    async fn clear_cache(&self) {
        self.page_cache.clear();
    }

    async fn enter(&self) -> Result<(), SearchError> {
        let mut persistent = self.session.lock().await;
        if persistent.is_none() {
            *persistent = Some(self.backend.open_session().await?);
        }
        Ok(())
    }

    async fn exit(&self) -> Result<(), SearchError> {
        let session = self.session.lock().await.take();
        match session {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for SiteEngine {
    fn drop(&mut self) {
        // enter 之后未 exit 的会话交给守卫异步关闭
        if let Some(session) = self.session.get_mut().take() {
            drop(SessionGuard::new(session));
        }
    }
}

/// 把内置站点全部注册到注册表
pub fn register_builtin_engines(
    registry: &EngineRegistry,
    backend: Arc<dyn BrowserBackend>,
) -> Result<(), SearchError> {
    for profile in builtin_profiles() {
        let descriptor = profile.descriptor();
        registry.register(descriptor, SiteEngine::factory(profile, backend.clone()))?;
    }
    Ok(())
}
