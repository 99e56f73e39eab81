// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::domain::search::engine::SearchError;
use crate::engines::traits::{BrowserAction, BrowserBackend, BrowserSession, RenderedPage};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct Instance<T> {
    value: Arc<T>,
    alive: Arc<AtomicBool>,
}

/// 可重建的共享实例
///
/// 启动函数拿到一个存活标记，连接断开时把它置为 false；
/// 之后的获取会重新启动，`invalidate` 可以主动丢弃当前实例。
pub(crate) struct RelaunchCell<T> {
    slot: Mutex<Option<Instance<T>>>,
}

impl<T> RelaunchCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub(crate) async fn get_or_launch<F, Fut>(&self, launch: F) -> Result<Arc<T>, SearchError>
    where
        F: FnOnce(Arc<AtomicBool>) -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(instance) = slot.as_ref() {
            if instance.alive.load(Ordering::SeqCst) {
                return Ok(instance.value.clone());
            }
            warn!("Browser connection lost, relaunching");
        }

        let alive = Arc::new(AtomicBool::new(true));
        let value = Arc::new(launch(alive.clone()).await?);
        *slot = Some(Instance {
            value: value.clone(),
            alive,
        });
        Ok(value)
    }

    /// 丢弃给定实例（已被替换时不做任何事）
    pub(crate) async fn invalidate(&self, value: &Arc<T>) {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|instance| Arc::ptr_eq(&instance.value, value))
        {
            *slot = None;
        }
    }
}

/// chromiumoxide 浏览器后端
///
/// 浏览器在第一次打开会话时启动（或连接远程调试地址），之后所有会话共享；
/// 每个会话对应一个独立页面。浏览器进程退出或连接断开后，下一次打开会话时重新启动。
#[derive(Clone)]
pub struct ChromiumBackend {
    settings: BrowserSettings,
    browser: Arc<RelaunchCell<Browser>>,
}

impl ChromiumBackend {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: Arc::new(RelaunchCell::new()),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs)
    }

    async fn browser(&self) -> Result<Arc<Browser>, SearchError> {
        self.browser
            .get_or_launch(|alive| async move {
                let (browser, mut handler) = match &self.settings.remote_debugging_url {
                    Some(url) => {
                        info!("Connecting to remote Chrome instance at: {}", url);
                        Browser::connect(url.as_str()).await.map_err(|e| {
                            SearchError::EngineError(format!("Failed to connect to remote Chrome: {}", e))
                        })?
                    }
                    None => {
                        let mut builder = BrowserConfig::builder()
                            .no_sandbox()
                            .request_timeout(self.request_timeout())
                            .arg("--disable-gpu")
                            .arg("--disable-dev-shm-usage");
                        if !self.settings.headless {
                            builder = builder.with_head();
                        }
                        let config = builder.build().map_err(SearchError::EngineError)?;
                        info!("Launching headless Chrome");
                        Browser::launch(config)
                            .await
                            .map_err(|e| SearchError::EngineError(format!("Failed to launch Chrome: {}", e)))?
                    }
                };

                // 事件循环结束即连接已断开
                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                    alive.store(false, Ordering::SeqCst);
                    debug!("Chrome event handler stopped");
                });

                Ok(browser)
            })
            .await
    }
}

#[async_trait]
impl BrowserBackend for ChromiumBackend {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, SearchError> {
        let browser = self.browser().await?;
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                self.browser.invalidate(&browser).await;
                return Err(SearchError::EngineError(format!("Failed to open page: {}", e)));
            }
        };
        Ok(Box::new(ChromiumSession {
            page,
            timeout: self.request_timeout(),
        }))
    }
}

struct ChromiumSession {
    page: Page,
    timeout: Duration,
}

impl ChromiumSession {
    async fn run_action(&self, action: &BrowserAction) -> Result<(), SearchError> {
        match action {
            BrowserAction::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            BrowserAction::Click { selector } => {
                self.page
                    .find_element(selector.as_str())
                    .await
                    .map_err(|e| SearchError::EngineError(format!("Click failed, element not found: {}", e)))?
                    .click()
                    .await
                    .map_err(|e| SearchError::EngineError(format!("Click failed: {}", e)))?;
            }
            BrowserAction::Scroll { direction } => {
                let script = match direction.as_str() {
                    "up" => "window.scrollBy(0, -window.innerHeight);",
                    "bottom" => "window.scrollTo(0, document.body.scrollHeight);",
                    "top" => "window.scrollTo(0, 0);",
                    _ => "window.scrollBy(0, window.innerHeight);",
                };
                self.page
                    .evaluate(script)
                    .await
                    .map_err(|e| SearchError::EngineError(format!("Scroll failed: {}", e)))?;
            }
            BrowserAction::Input { selector, text } => {
                self.page
                    .find_element(selector.as_str())
                    .await
                    .map_err(|e| SearchError::EngineError(format!("Input failed, element not found: {}", e)))?
                    .type_str(text)
                    .await
                    .map_err(|e| SearchError::EngineError(format!("Input failed: {}", e)))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open(&mut self, url: &str, actions: &[BrowserAction]) -> Result<RenderedPage, SearchError> {
        // 导航、动作与读取内容整体受请求超时约束
        tokio::time::timeout(self.timeout, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| SearchError::EngineError(format!("Navigation failed: {}", e)))?;

            for action in actions {
                self.run_action(action).await?;
            }

            let html = self
                .page
                .content()
                .await
                .map_err(|e| SearchError::EngineError(e.to_string()))?;
            debug!("Rendered {} ({} bytes)", url, html.len());
            Ok(RenderedPage::new(url, html))
        })
        .await
        .map_err(|_| SearchError::Timeout)?
    }

    async fn close(self: Box<Self>) -> Result<(), SearchError> {
        self.page
            .close()
            .await
            .map_err(|e| SearchError::EngineError(format!("Failed to close page: {}", e)))
    }
}
