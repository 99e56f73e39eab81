// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::feed::FeedSubscription;
use crate::infrastructure::rss::fetcher::FeedError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 模板文件扩展名
pub const TEMPLATE_EXTENSION: &str = ".rss.toml";

fn default_true() -> bool {
    true
}

fn default_update_interval() -> u64 {
    3600
}

/// 模板元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedTemplateMeta {
    pub name: String,
    pub description: String,
    pub language: Option<String>,
    pub provider: Option<String>,
    pub version: Option<String>,
    #[serde(default = "default_true")]
    pub persistent: bool,
    #[serde(default = "default_true")]
    pub auto_update: bool,
    /// 自动更新间隔（秒）
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
}

/// 订阅模板：分类到订阅源地址的映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedTemplate {
    pub meta: FeedTemplateMeta,
    #[serde(default)]
    pub feeds: BTreeMap<String, String>,
}

impl FeedTemplate {
    /// 按分类生成订阅，`categories` 为 `None` 时包含全部分类
    ///
    /// 未知分类被忽略，结果按分类名排序
    pub fn subscriptions(&self, categories: Option<&[String]>) -> Vec<FeedSubscription> {
        self.feeds
            .iter()
            .filter(|(category, _)| categories.is_none_or(|wanted| wanted.contains(*category)))
            .map(|(category, url)| FeedSubscription {
                name: format!("{}-{}", self.meta.name, category),
                url: url.clone(),
                category: category.clone(),
            })
            .collect()
    }
}

/// 模板目录
#[derive(Debug, Clone)]
pub struct FeedTemplateStore {
    dir: PathBuf,
}

impl FeedTemplateStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 列出可用模板名（按名称排序），目录不存在时返回空列表
    pub fn list_templates(&self) -> Result<Vec<String>, FeedError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            FeedError::Template(format!("Failed to read {}: {}", self.dir.display(), e))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name().into_string().ok()?;
                file_name
                    .strip_suffix(TEMPLATE_EXTENSION)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn load_template(&self, name: &str) -> Result<FeedTemplate, FeedError> {
        validate_template_name(name)?;
        let path = self.dir.join(format!("{}{}", name, TEMPLATE_EXTENSION));
        if !path.exists() {
            return Err(FeedError::Template(format!("Template '{}' not found", name)));
        }

        debug!("Loading feed template {}", path.display());
        let content = std::fs::read_to_string(&path)
            .map_err(|e| FeedError::Template(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse_template(&content)
    }

    pub fn parse_template(content: &str) -> Result<FeedTemplate, FeedError> {
        toml::from_str(content).map_err(|e| FeedError::Template(e.to_string()))
    }

    pub fn subscriptions_from_template(
        &self,
        name: &str,
        categories: Option<&[String]>,
    ) -> Result<Vec<FeedSubscription>, FeedError> {
        Ok(self.load_template(name)?.subscriptions(categories))
    }
}

/// 模板名只能是目录内的文件名
fn validate_template_name(name: &str) -> Result<(), FeedError> {
    let invalid = name.is_empty()
        || name.contains("..")
        || name.contains(['/', '\\'])
        || Path::new(name).is_absolute();
    if invalid {
        return Err(FeedError::Template(format!("Invalid template name '{}'", name)));
    }
    Ok(())
}
