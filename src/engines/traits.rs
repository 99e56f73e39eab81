// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::search::engine::SearchError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 页面交互动作
///
/// 按顺序在导航完成后执行，目标页面异步渲染时通常需要 `Wait`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BrowserAction {
    Wait { ms: u64 },
    Click { selector: String },
    Scroll { direction: String },
    Input { selector: String, text: String },
}

/// 浏览器会话
///
/// 单写者：同一会话不会被并发使用
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到 `url`，执行动作后返回渲染完成的页面
    async fn open(&mut self, url: &str, actions: &[BrowserAction]) -> Result<RenderedPage, SearchError>;

    /// 关闭会话并释放底层资源
    async fn close(self: Box<Self>) -> Result<(), SearchError>;
}

/// 浏览器自动化后端
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, SearchError>;
}

/// 渲染后的页面
///
/// 只保存 HTML 文本；`scraper::Html` 不是 `Send`，每次查询时现场解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// 按 CSS 选择器查询元素，选择器非法时返回 `EngineError`
    pub fn query(&self, selector: &str) -> Result<Vec<PageElement>, SearchError> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        Ok(document.select(&selector).map(PageElement::from_ref).collect())
    }
}

/// 页面元素的快照
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageElement {
    text: String,
    html: String,
    attrs: HashMap<String, String>,
}

impl PageElement {
    fn from_ref(element: ElementRef<'_>) -> Self {
        Self {
            text: element.text().collect::<String>(),
            html: element.html(),
            attrs: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// 元素内全部文本，空白折叠为单个空格
    pub fn text(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// 在元素内部继续查询
    pub fn query(&self, selector: &str) -> Result<Vec<PageElement>, SearchError> {
        let selector = parse_selector(selector)?;
        let fragment = Html::parse_fragment(&self.html);
        Ok(fragment.select(&selector).map(PageElement::from_ref).collect())
    }

    /// 内部第一个匹配元素
    pub fn first(&self, selector: &str) -> Result<Option<PageElement>, SearchError> {
        Ok(self.query(selector)?.into_iter().next())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SearchError> {
    Selector::parse(selector)
        .map_err(|e| SearchError::EngineError(format!("Invalid selector '{}': {}", selector, e)))
}
