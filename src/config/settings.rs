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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含搜索编排、缓存、重试、浏览器、RSS、日志和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 搜索编排配置
    pub search: SearchSettings,
    /// 结果缓存配置
    pub cache: CacheSettings,
    /// 重试配置
    pub retry: RetrySettings,
    /// 浏览器后端配置
    pub browser: BrowserSettings,
    /// RSS 配置
    pub rss: RssSettings,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 搜索编排配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 单个引擎的超时时间（毫秒）
    pub engine_timeout_ms: u64,
    /// 同时运行的引擎数上限
    pub max_concurrent_engines: usize,
    /// 覆盖全局默认引擎集合（为空时按标签选择）
    #[serde(default)]
    pub global_engines: Vec<String>,
    /// 覆盖中国模式默认引擎集合（为空时按标签选择）
    #[serde(default)]
    pub china_engines: Vec<String>,
}

/// 缓存配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 搜索结果缓存时间（秒），0 表示不缓存
    pub ttl_secs: u64,
    /// RSS 源缓存时间（秒）
    pub feed_ttl_secs: u64,
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 最大尝试次数
    pub max_retries: u32,
    /// 初始退避时间（毫秒）
    pub base_delay_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_backoff_ms: u64,
    /// 是否启用抖动
    pub jitter: bool,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头运行
    pub headless: bool,
    /// 远程调试地址，设置后连接已有的 Chrome 实例
    pub remote_debugging_url: Option<String>,
    /// CDP 请求超时（秒）
    pub request_timeout_secs: u64,
}

/// RSS 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RssSettings {
    /// 抓取超时（秒）
    pub request_timeout_secs: u64,
    /// User-Agent
    pub user_agent: String,
    /// 模板目录
    pub template_dir: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 默认过滤器，RUST_LOG 优先
    pub filter: String,
    /// 是否输出 JSON 格式
    pub json: bool,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 监听地址
    pub listen_addr: String,
}

impl SearchSettings {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn feed_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_ttl_secs)
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `SEESEA__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SEESEA").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 只使用内置默认值构建配置，不读取文件和环境变量
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Search defaults
            .set_default("search.engine_timeout_ms", 15_000)?
            .set_default("search.max_concurrent_engines", 8)?
            .set_default("search.global_engines", Vec::<String>::new())?
            .set_default("search.china_engines", Vec::<String>::new())?
            // Cache defaults
            .set_default("cache.ttl_secs", 300)?
            .set_default("cache.feed_ttl_secs", 3600)?
            // Retry defaults
            .set_default("retry.max_retries", 3)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_backoff_ms", 30_000)?
            .set_default("retry.jitter", false)?
            // Browser defaults
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            // RSS defaults
            .set_default("rss.request_timeout_secs", 20)?
            .set_default("rss.user_agent", "seesea/0.1")?
            .set_default("rss.template_dir", "templates/rss")?
            // Logging and metrics defaults
            .set_default("logging.filter", "info,seesea=debug")?
            .set_default("logging.json", false)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}
