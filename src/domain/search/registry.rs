// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_query::SearchQuery;
use crate::domain::search::engine::{
    BrowserEngine, EngineDescriptor, SearchError, TAG_CHINA, TAG_GLOBAL,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// 引擎工厂，每次调用返回一个独立实例
pub type EngineFactory = Arc<dyn Fn() -> Arc<dyn BrowserEngine> + Send + Sync>;

struct RegisteredEngine {
    descriptor: EngineDescriptor,
    factory: EngineFactory,
}

/// 引擎注册表
///
/// 按名称保存引擎描述和工厂，保持注册顺序。
/// `get` 每次都通过工厂创建新实例，因此并发扇出不会共享同一个浏览器会话。
#[derive(Default)]
pub struct EngineRegistry {
    engines: RwLock<Vec<RegisteredEngine>>,
    global_override: RwLock<Option<Vec<String>>>,
    china_override: RwLock<Option<Vec<String>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册引擎，名称重复时拒绝
    pub fn register(
        &self,
        descriptor: EngineDescriptor,
        factory: EngineFactory,
    ) -> Result<(), SearchError> {
        let mut engines = self.engines.write();
        if engines.iter().any(|e| e.descriptor.name == descriptor.name) {
            return Err(SearchError::DuplicateEngine(descriptor.name));
        }
        info!("Registered search engine: {} {:?}", descriptor.name, descriptor.tags);
        engines.push(RegisteredEngine { descriptor, factory });
        Ok(())
    }

    /// 以闭包形式注册引擎
    pub fn register_fn<F>(&self, descriptor: EngineDescriptor, factory: F) -> Result<(), SearchError>
    where
        F: Fn() -> Arc<dyn BrowserEngine> + Send + Sync + 'static,
    {
        self.register(descriptor, Arc::new(factory))
    }

    /// 按名称创建引擎实例
    pub fn get(&self, name: &str) -> Result<Arc<dyn BrowserEngine>, SearchError> {
        let factory = self
            .engines
            .read()
            .iter()
            .find(|e| e.descriptor.name == name)
            .map(|e| e.factory.clone())
            .ok_or_else(|| SearchError::UnknownEngine(name.to_string()))?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.read().iter().any(|e| e.descriptor.name == name)
    }

    pub fn descriptor(&self, name: &str) -> Option<EngineDescriptor> {
        self.engines
            .read()
            .iter()
            .find(|e| e.descriptor.name == name)
            .map(|e| e.descriptor.clone())
    }

    /// 按注册顺序列出所有引擎
    pub fn list(&self) -> Vec<EngineDescriptor> {
        self.engines
            .read()
            .iter()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.engines
            .read()
            .iter()
            .map(|e| e.descriptor.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.engines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.read().is_empty()
    }

    /// 覆盖某个模式下的默认引擎集合，空列表恢复为按标签选择
    pub fn set_default_set(&self, china_mode: bool, names: Vec<String>) -> Result<(), SearchError> {
        if let Some(unknown) = names.iter().find(|n| !self.contains(n)) {
            return Err(SearchError::UnknownEngine(unknown.clone()));
        }
        let slot = if china_mode {
            &self.china_override
        } else {
            &self.global_override
        };
        *slot.write() = if names.is_empty() { None } else { Some(names) };
        Ok(())
    }

    /// 默认引擎集合
    ///
    /// 有覆盖时使用覆盖列表，否则按注册顺序选出带 `china` 或 `global` 标签的引擎
    pub fn default_set(&self, china_mode: bool) -> Vec<String> {
        let (slot, tag) = if china_mode {
            (&self.china_override, TAG_CHINA)
        } else {
            (&self.global_override, TAG_GLOBAL)
        };
        if let Some(names) = slot.read().as_ref() {
            return names.clone();
        }
        self.engines
            .read()
            .iter()
            .filter(|e| e.descriptor.has_tag(tag))
            .map(|e| e.descriptor.name.clone())
            .collect()
    }

    /// 解析查询的有效引擎集合，未知名称在扇出前拒绝
    pub fn resolve(&self, query: &SearchQuery) -> Result<Vec<String>, SearchError> {
        if query.engines().is_empty() {
            return Ok(self.default_set(query.china_mode()));
        }
        for name in query.engines() {
            if !self.contains(name) {
                return Err(SearchError::UnknownEngine(name.clone()));
            }
        }
        Ok(query.engines().to_vec())
    }
}
