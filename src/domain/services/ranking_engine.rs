// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ranking::{KeywordWeight, RankedItem, Rankable};
use crate::domain::models::search_result::SearchResultItem;

/// 默认最多返回的条目数
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// 关键词加权排序引擎
///
/// 纯函数：不做任何 I/O，相同输入总是得到相同输出。
/// 每个关键词（忽略大小写的子串匹配）命中一次就累加其权重，
/// 低于 `min_score` 的条目被丢弃（等于阈值的保留），
/// 剩余条目按分数降序稳定排序后截断到 `max_results`。
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计算单个条目的分数和命中的关键词（按调用方给出的顺序）
    pub fn score<T: Rankable>(&self, item: &T, keywords: &[KeywordWeight]) -> (f64, Vec<String>) {
        let text = item.rank_text().to_lowercase();
        let mut score = 0.0;
        let mut matched = Vec::new();
        for kw in keywords {
            if text.contains(&kw.keyword().to_lowercase()) {
                score += kw.weight();
                matched.push(kw.keyword().to_string());
            }
        }
        (score, matched)
    }

    pub fn rank<T: Rankable>(
        &self,
        items: Vec<T>,
        keywords: &[KeywordWeight],
        min_score: f64,
        max_results: usize,
    ) -> Vec<RankedItem<T>> {
        let mut ranked: Vec<RankedItem<T>> = items
            .into_iter()
            .filter_map(|item| {
                let (score, matched_keywords) = self.score(&item, keywords);
                (score >= min_score).then_some(RankedItem {
                    item,
                    score,
                    matched_keywords,
                })
            })
            .collect();

        // sort_by 是稳定排序，同分条目保持输入顺序
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(max_results);
        ranked
    }

    /// 对搜索结果排序，分数写回 `SearchResultItem::score`
    pub fn rank_results(
        &self,
        results: Vec<SearchResultItem>,
        keywords: &[KeywordWeight],
        min_score: f64,
        max_results: usize,
    ) -> Vec<SearchResultItem> {
        self.rank(results, keywords, min_score, max_results)
            .into_iter()
            .map(|ranked| SearchResultItem {
                score: ranked.score,
                ..ranked.item
            })
            .collect()
    }
}
