// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::feed::{Feed, FeedQuery, FeedSubscription};
use crate::domain::models::ranking::{KeywordWeight, RankingResult};
use crate::domain::services::ranking_engine::RankingEngine;
use crate::infrastructure::cache::result_cache::ResultCache;
use crate::infrastructure::rss::fetcher::{FeedError, FeedFetcher};
use crate::infrastructure::rss::parser::FeedParser;
use crate::infrastructure::rss::template::FeedTemplateStore;
use chrono::Utc;
use futures::future::join_all;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 订阅源读取与排行
///
/// 抓取结果按 URL 缓存 `feed_ttl`，同一 URL 的并发读取只抓取一次
pub struct RssFeedSource {
    fetcher: Arc<dyn FeedFetcher>,
    parser: Arc<dyn FeedParser>,
    cache: ResultCache<Feed, FeedError>,
    feed_ttl: Duration,
    ranking: RankingEngine,
}

impl RssFeedSource {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        parser: Arc<dyn FeedParser>,
        feed_ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            parser,
            cache: ResultCache::new(),
            feed_ttl,
            ranking: RankingEngine::new(),
        }
    }

    /// 抓取并解析单个订阅源
    pub async fn fetch(&self, url: &str) -> Result<Feed, FeedError> {
        let fetcher = self.fetcher.clone();
        let parser = self.parser.clone();
        let target = url.to_string();

        self.cache
            .get_or_compute(&feed_fingerprint(url), self.feed_ttl, move || async move {
                let raw = fetcher.fetch(&target).await?;
                let feed = parser.parse(&raw)?;
                debug!("Parsed {} items from {}", feed.items.len(), target);
                Ok(feed)
            })
            .await
    }

    /// 抓取后应用过滤条件
    pub async fn fetch_query(&self, query: &FeedQuery) -> Result<Feed, FeedError> {
        let feed = self.fetch(&query.url).await?;
        Ok(query.apply(feed))
    }

    /// 并发抓取多个订阅源并按关键词排行
    ///
    /// 失败的订阅源只记录警告并跳过；条目按订阅源顺序拼接后参与打分
    pub async fn create_ranking(
        &self,
        name: &str,
        feed_urls: &[String],
        keywords: &[KeywordWeight],
        min_score: f64,
        max_results: usize,
    ) -> RankingResult {
        let feeds = join_all(feed_urls.iter().map(|url| self.fetch(url))).await;

        let mut items = Vec::new();
        for (url, feed) in feed_urls.iter().zip(feeds) {
            match feed {
                Ok(feed) => items.extend(feed.items),
                Err(e) => {
                    warn!("Skipping feed {}: {}", url, e);
                    metrics::counter!("seesea_feed_failures_total").increment(1);
                }
            }
        }

        let total_items = items.len();
        let items = self.ranking.rank(items, keywords, min_score, max_results);
        info!(
            "Ranking '{}': {} of {} items kept from {} feeds",
            name,
            items.len(),
            total_items,
            feed_urls.len()
        );

        RankingResult {
            name: name.to_string(),
            items,
            total_items,
            timestamp: Utc::now(),
        }
    }

    /// 按模板生成订阅并预先抓取一次，返回生成的订阅
    ///
    /// 预抓取失败不影响订阅本身，只记录警告
    pub async fn add_from_template(
        &self,
        store: &FeedTemplateStore,
        template: &str,
        categories: Option<&[String]>,
    ) -> Result<Vec<FeedSubscription>, FeedError> {
        let subscriptions = store.subscriptions_from_template(template, categories)?;

        let warmed = join_all(subscriptions.iter().map(|sub| self.fetch(&sub.url))).await;
        for (sub, result) in subscriptions.iter().zip(warmed) {
            if let Err(e) = result {
                warn!("Failed to prefetch {} ({}): {}", sub.name, sub.url, e);
            }
        }

        info!(
            "Added {} subscriptions from template '{}'",
            subscriptions.len(),
            template
        );
        Ok(subscriptions)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn feed_fingerprint(url: &str) -> String {
    hex::encode(Sha256::digest(url.trim().as_bytes()))
}
