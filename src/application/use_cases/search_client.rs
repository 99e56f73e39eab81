// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::ranking_request::RankingRequestDto;
use crate::application::dto::search_request::{SearchRequestDto, SearchResponseDto};
use crate::config::settings::Settings;
use crate::domain::models::feed::{Feed, FeedQuery, FeedSubscription};
use crate::domain::models::ranking::{KeywordWeight, RankingResult};
use crate::domain::models::search_query::SearchQuery;
use crate::domain::models::search_result::SearchResultItem;
use crate::domain::search::engine::{EngineDescriptor, SearchError};
use crate::domain::search::registry::EngineRegistry;
use crate::domain::services::ranking_engine::RankingEngine;
use crate::engines::chromium_backend::ChromiumBackend;
use crate::engines::site_engine::register_builtin_engines;
use crate::engines::traits::BrowserBackend;
use crate::infrastructure::observability::stats::{StatsCollector, StatsSnapshot};
use crate::infrastructure::rss::{
    FeedError, FeedTemplate, FeedTemplateStore, HttpFeedFetcher, RssFeedSource, TagFeedParser,
};
use crate::infrastructure::search::engine_health::HealthReport;
use crate::infrastructure::search::orchestrator::{
    ExecuteOptions, OrchestratorConfig, SearchOrchestrator,
};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// 默认排行名称
const DEFAULT_RANKING_NAME: &str = "ranking";

/// 搜索与订阅源排行的统一入口
///
/// 外层包装（HTTP、绑定等）只需要持有这一个对象
pub struct SeeSeaClient {
    orchestrator: SearchOrchestrator,
    feeds: RssFeedSource,
    templates: FeedTemplateStore,
}

impl SeeSeaClient {
    pub fn new(
        orchestrator: SearchOrchestrator,
        feeds: RssFeedSource,
        templates: FeedTemplateStore,
    ) -> Self {
        Self {
            orchestrator,
            feeds,
            templates,
        }
    }

    /// 按配置构建：Chromium 后端、内置站点引擎、HTTP 订阅源抓取
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let backend: Arc<dyn BrowserBackend> =
            Arc::new(ChromiumBackend::new(settings.browser.clone()));
        Self::with_backend(settings, backend)
    }

    /// 使用给定的浏览器后端构建
    pub fn with_backend(
        settings: &Settings,
        backend: Arc<dyn BrowserBackend>,
    ) -> anyhow::Result<Self> {
        let registry = Arc::new(EngineRegistry::new());
        register_builtin_engines(&registry, backend)
            .context("Failed to register builtin engines")?;
        registry
            .set_default_set(false, settings.search.global_engines.clone())
            .context("Invalid search.global_engines")?;
        registry
            .set_default_set(true, settings.search.china_engines.clone())
            .context("Invalid search.china_engines")?;

        let orchestrator = SearchOrchestrator::new(
            registry.clone(),
            Arc::new(StatsCollector::new()),
            OrchestratorConfig::from_settings(settings),
        );

        let fetcher = HttpFeedFetcher::new(&settings.rss).context("Failed to build feed fetcher")?;
        let feeds = RssFeedSource::new(
            Arc::new(fetcher),
            Arc::new(TagFeedParser::new()),
            settings.cache.feed_ttl(),
        );

        info!("SeeSea client ready with {} engines", registry.len());
        Ok(Self::new(
            orchestrator,
            feeds,
            FeedTemplateStore::new(&settings.rss.template_dir),
        ))
    }

    /// 执行搜索
    ///
    /// `engines` 为空或 `None` 时使用默认集合（`china_mode` 决定使用哪一组）
    #[allow(clippy::too_many_arguments)]
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        language: Option<&str>,
        region: Option<&str>,
        engines: Option<&[String]>,
        china_mode: bool,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        let query = SearchQuery::builder(query)
            .page(page)
            .page_size(page_size)
            .language(language)
            .region(region)
            .engines(engines.unwrap_or_default().iter().map(String::as_str))
            .china_mode(china_mode)
            .build()?;
        self.orchestrator.execute(&query).await
    }

    /// 执行结构化的搜索请求
    pub async fn search_request(
        &self,
        request: &SearchRequestDto,
    ) -> Result<SearchResponseDto, SearchError> {
        let query = request.to_query()?;
        let options = ExecuteOptions {
            bypass_cache: request.force,
            ..ExecuteOptions::default()
        };
        let results = self.orchestrator.execute_with(&query, options).await?;
        Ok(SearchResponseDto::new(&query, results))
    }

    /// 搜索后按关键词对结果重新排序，分数写入每条结果
    pub async fn search_ranked(
        &self,
        query: &SearchQuery,
        keywords: &[(String, f64)],
        min_score: f64,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        let keywords = KeywordWeight::from_pairs(keywords.iter().map(|(k, w)| (k.as_str(), *w)))
            .map_err(|e| SearchError::InvalidQuery(e.to_string()))?;
        let results = self.orchestrator.execute(query).await?;
        let limit = results.len();
        Ok(RankingEngine::new().rank_results(results, &keywords, min_score, limit))
    }

    /// 使用自定义选项（截止时间、跳过缓存）执行查询
    pub async fn search_with(
        &self,
        query: &SearchQuery,
        options: ExecuteOptions,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        self.orchestrator.execute_with(query, options).await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.orchestrator.stats()
    }

    /// 清空搜索结果缓存和订阅源缓存，统计数据保留
    pub fn clear_cache(&self) {
        self.orchestrator.clear_cache();
        self.feeds.clear_cache();
    }

    pub fn list_engines(&self) -> Vec<EngineDescriptor> {
        self.orchestrator.list_engines()
    }

    pub fn list_global_engines(&self) -> Vec<String> {
        self.orchestrator.registry().default_set(false)
    }

    pub fn list_china_engines(&self) -> Vec<String> {
        self.orchestrator.registry().default_set(true)
    }

    pub fn health_check(&self) -> HealthReport {
        self.orchestrator.health_check()
    }

    /// 对多个订阅源按关键词排行
    ///
    /// 关键词校验失败时整体返回错误；单个订阅源失败只会被跳过
    pub async fn create_ranking(
        &self,
        feed_urls: &[String],
        keywords: &[(String, f64)],
        min_score: f64,
        max_results: usize,
    ) -> Result<RankingResult, FeedError> {
        let keywords =
            KeywordWeight::from_pairs(keywords.iter().map(|(k, w)| (k.as_str(), *w)))?;
        Ok(self
            .feeds
            .create_ranking(DEFAULT_RANKING_NAME, feed_urls, &keywords, min_score, max_results)
            .await)
    }

    pub async fn ranking_request(
        &self,
        request: &RankingRequestDto,
    ) -> Result<RankingResult, FeedError> {
        let keywords = request.keyword_weights()?;
        Ok(self
            .feeds
            .create_ranking(
                &request.name,
                &request.feed_urls,
                &keywords,
                request.min_score,
                request.max_results,
            )
            .await)
    }

    pub async fn fetch_feed(&self, query: &FeedQuery) -> Result<Feed, FeedError> {
        self.feeds.fetch_query(query).await
    }

    pub fn list_templates(&self) -> Result<Vec<String>, FeedError> {
        self.templates.list_templates()
    }

    pub fn load_template(&self, name: &str) -> Result<FeedTemplate, FeedError> {
        self.templates.load_template(name)
    }

    pub fn subscriptions_from_template(
        &self,
        name: &str,
        categories: Option<&[String]>,
    ) -> Result<Vec<FeedSubscription>, FeedError> {
        self.templates.subscriptions_from_template(name, categories)
    }

    /// 按模板添加订阅并预抓取，返回添加的订阅数
    pub async fn add_from_template(
        &self,
        name: &str,
        categories: Option<&[String]>,
    ) -> Result<usize, FeedError> {
        let subscriptions = self
            .feeds
            .add_from_template(&self.templates, name, categories)
            .await?;
        Ok(subscriptions.len())
    }
}
