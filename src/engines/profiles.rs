// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_result::SearchResultItem;
use crate::domain::search::engine::{EngineDescriptor, SearchError, TAG_CHINA, TAG_GLOBAL};
use crate::engines::traits::{BrowserAction, RenderedPage};
use crate::utils::url_utils::absolutize_href;
use serde::{Deserialize, Serialize};
use url::Url;

/// 站点抓取配置
///
/// URL 模板支持以下占位符：
/// - `{query}`：URL 编码后的查询
/// - `{page}` / `{page0}`：从 1 / 0 开始的页码
/// - `{offset}`：`offset_base + (page - 1) * results_per_page`
/// - `{limit}`：本次请求的最大结果数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub url_template: String,
    /// 站点每页结果数，用于计算 `{offset}`
    pub results_per_page: u32,
    pub offset_base: u32,
    /// 提取前等待的毫秒数，0 表示不等待
    pub wait_ms: u64,
    /// 等待之后额外执行的动作
    #[serde(default)]
    pub actions: Vec<BrowserAction>,
    pub item_selector: String,
    pub title_selector: String,
    pub link_selector: String,
    pub snippet_selector: Option<String>,
}

impl SiteProfile {
    pub fn descriptor(&self) -> EngineDescriptor {
        self.tags.iter().fold(
            EngineDescriptor::new(&self.name, &self.description),
            |d, tag| d.with_tag(tag.clone()),
        )
    }

    pub fn build_url(&self, query: &str, page: u32, max_results: u32) -> String {
        let page = page.max(1);
        let offset = self.offset_base + (page - 1) * self.results_per_page;
        self.url_template
            .replace("{query}", &urlencoding::encode(query))
            .replace("{page0}", &(page - 1).to_string())
            .replace("{page}", &page.to_string())
            .replace("{offset}", &offset.to_string())
            .replace("{limit}", &max_results.to_string())
    }

    /// 完整动作序列：先等待，再执行额外动作
    pub fn action_sequence(&self) -> Vec<BrowserAction> {
        let mut actions = Vec::with_capacity(self.actions.len() + 1);
        if self.wait_ms > 0 {
            actions.push(BrowserAction::Wait { ms: self.wait_ms });
        }
        actions.extend(self.actions.iter().cloned());
        actions
    }

    /// 从渲染后的页面提取结果
    ///
    /// 缺少标题或可用链接的条目被跳过；没有任何条目是合法的空结果
    pub fn extract(
        &self,
        page: &RenderedPage,
        max_results: u32,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        let base = Url::parse(&page.url).ok();
        let mut results = Vec::new();

        for element in page.query(&self.item_selector)? {
            if results.len() >= max_results as usize {
                break;
            }

            let title = element
                .first(&self.title_selector)?
                .map(|e| e.text())
                .unwrap_or_default();
            let url = element
                .first(&self.link_selector)?
                .and_then(|e| e.attribute("href").map(str::to_string))
                .and_then(|href| absolutize_href(base.as_ref(), &href));

            let Some(url) = url else { continue };
            if title.is_empty() {
                continue;
            }

            let content = match &self.snippet_selector {
                Some(selector) => element.first(selector)?.map(|e| e.text()).unwrap_or_default(),
                None => String::new(),
            };

            results.push(SearchResultItem::new(title, url, content, self.name.clone()));
        }

        Ok(results)
    }
}

#[allow(clippy::too_many_arguments)]
fn profile(
    name: &str,
    description: &str,
    tags: &[&str],
    url_template: &str,
    results_per_page: u32,
    offset_base: u32,
    wait_ms: u64,
    selectors: [&str; 4],
) -> SiteProfile {
    let [item, title, link, snippet] = selectors;
    SiteProfile {
        name: name.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        url_template: url_template.to_string(),
        results_per_page,
        offset_base,
        wait_ms,
        actions: Vec::new(),
        item_selector: item.to_string(),
        title_selector: title.to_string(),
        link_selector: link.to_string(),
        snippet_selector: (!snippet.is_empty()).then(|| snippet.to_string()),
    }
}

/// 内置站点配置，注册顺序即默认集合顺序
pub fn builtin_profiles() -> Vec<SiteProfile> {
    vec![
        profile(
            "xinhua",
            "新华网搜索",
            &[TAG_CHINA, "news"],
            "https://so.news.cn/#search/0/{query}/{page}/0",
            10,
            0,
            3000,
            [".items .item", ".title", ".title a", ".des"],
        ),
        profile(
            "baidu",
            "百度搜索",
            &[TAG_CHINA],
            "https://www.baidu.com/s?wd={query}&pn={offset}&rn={limit}",
            10,
            0,
            1500,
            ["div.c-container", "h3", "h3 a", ".c-abstract, .content-right_8Zs40"],
        ),
        profile(
            "bing",
            "Bing",
            &[TAG_GLOBAL, TAG_CHINA],
            "https://www.bing.com/search?q={query}&first={offset}",
            10,
            1,
            1500,
            ["li.b_algo", "h2", "h2 a", ".b_caption p"],
        ),
        profile(
            "sogou",
            "搜狗搜索",
            &[TAG_CHINA],
            "https://www.sogou.com/web?query={query}&page={page}",
            10,
            0,
            1500,
            [".vrwrap, .rb", "h3", "h3 > a", ".str_info, .space-txt"],
        ),
        profile(
            "so360",
            "360 搜索",
            &[TAG_CHINA],
            "https://www.so.com/s?q={query}&pn={page}",
            10,
            0,
            1500,
            ["li.res-list", "h3", "h3 a", ".res-desc"],
        ),
        profile(
            "yandex",
            "Yandex",
            &[TAG_GLOBAL],
            "https://yandex.com/search/?text={query}&p={page0}",
            10,
            0,
            2000,
            ["li.serp-item", "h2", "a.OrganicTitle-Link, h2 a", ".OrganicTextContentSpan"],
        ),
        profile(
            "duckduckgo",
            "DuckDuckGo",
            &[TAG_GLOBAL],
            "https://html.duckduckgo.com/html/?q={query}&s={offset}",
            30,
            0,
            0,
            [".result", ".result__title", "a.result__a", ".result__snippet"],
        ),
    ]
}
