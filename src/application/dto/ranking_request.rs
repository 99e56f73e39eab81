// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ranking::{KeywordWeight, RankingError};
use crate::domain::services::ranking_engine::DEFAULT_MAX_RESULTS;
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// 订阅源排行请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RankingRequestDto {
    #[serde(default = "default_name")]
    pub name: String,
    #[validate(length(min = 1, message = "At least one feed url is required"))]
    pub feed_urls: Vec<String>,
    /// `(keyword, weight)` 对，权重范围 [1, 10]
    pub keywords: Vec<(String, f64)>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub min_score: f64,
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1))]
    pub max_results: usize,
}

fn default_name() -> String {
    "ranking".to_string()
}

impl RankingRequestDto {
    pub fn keyword_weights(&self) -> Result<Vec<KeywordWeight>, RankingError> {
        self.validate()
            .map_err(|e| RankingError::InvalidRequest(e.to_string()))?;
        KeywordWeight::from_pairs(self.keywords.iter().map(|(k, w)| (k.as_str(), *w)))
    }
}
