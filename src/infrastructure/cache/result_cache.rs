// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::observability::stats::StatsCollector;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum Slot<V, E> {
    Ready {
        value: V,
        created_at: Instant,
        expires_at: Instant,
    },
    /// 正在进行的计算。只保存弱引用：所有等待者都放弃后计算随之取消，
    /// 标记被视为不存在。
    Pending {
        fetch: WeakShared<BoxFuture<'static, Result<V, E>>>,
        generation: u64,
    },
}

enum Lookup<V, E> {
    Hit(V),
    Fetch(SharedFetch<V, E>),
}

/// 缓存条目的只读视图
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub fingerprint: String,
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// 按指纹缓存结果的 TTL 缓存
///
/// - 命中未过期条目直接返回（记一次命中）
/// - 同一指纹已有计算在进行时，加入该计算共享结果（同样记为命中）
/// - 否则启动计算（记一次未命中），成功结果按 TTL 存储
///
/// 失败不缓存，所有等待者收到同一个错误，指纹立即可以重新计算。
/// 过期条目在读取时惰性淘汰，`purge_expired` 可供后台清理使用。
pub struct ResultCache<V, E> {
    entries: Arc<DashMap<String, Slot<V, E>>>,
    generation: AtomicU64,
    stats: Option<Arc<StatsCollector>>,
}

impl<V, E> Default for ResultCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> ResultCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            stats: None,
        }
    }

    /// 命中与未命中写入给定的统计收集器
    pub fn with_stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// 读取或计算
    ///
    /// `ttl` 为零时结果不会被存储，但并发的同指纹请求仍然共享同一次计算。
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        match self.lookup_or_start(fingerprint, ttl, compute) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Fetch(fetch) => fetch.await,
        }
    }

    fn lookup_or_start<F, Fut>(&self, fingerprint: &str, ttl: Duration, compute: F) -> Lookup<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let now = Instant::now();
        // entry 持有分片锁，分支内不能 await
        let vacancy = match self.entries.entry(fingerprint.to_string()) {
            Entry::Occupied(mut occupied) => {
                match occupied.get() {
                    Slot::Ready {
                        value, expires_at, ..
                    } if *expires_at > now => {
                        debug!("Cache hit: {}", short(fingerprint));
                        self.record_hit();
                        return Lookup::Hit(value.clone());
                    }
                    Slot::Pending { fetch, .. } => {
                        if let Some(shared) = fetch.upgrade() {
                            debug!("Joining in-flight fetch: {}", short(fingerprint));
                            self.record_hit();
                            return Lookup::Fetch(shared);
                        }
                    }
                    Slot::Ready { .. } => {}
                }
                // 过期条目或已失效的计算标记
                let (shared, slot) = self.start(fingerprint, ttl, compute);
                if let Some(slot) = slot {
                    occupied.insert(slot);
                } else {
                    occupied.remove();
                }
                return Lookup::Fetch(shared);
            }
            Entry::Vacant(vacant) => vacant,
        };

        let (shared, slot) = self.start(fingerprint, ttl, compute);
        if let Some(slot) = slot {
            vacancy.insert(slot);
        }
        Lookup::Fetch(shared)
    }

    fn start<F, Fut>(
        &self,
        fingerprint: &str,
        ttl: Duration,
        compute: F,
    ) -> (SharedFetch<V, E>, Option<Slot<V, E>>)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        debug!("Cache miss: {}", short(fingerprint));
        self.record_miss();

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let entries = Arc::clone(&self.entries);
        let key = fingerprint.to_string();

        // compute 在首次被 poll 时才调用，此时分片锁已经释放
        let fetch: SharedFetch<V, E> = async move {
            let result = compute().await;
            settle(&entries, key, generation, ttl, &result);
            result
        }
        .boxed()
        .shared();

        let slot = fetch
            .downgrade()
            .map(|weak| Slot::Pending { fetch: weak, generation });
        (fetch, slot)
    }

    /// 读取未过期的条目，不触发计算也不计入统计
    pub fn get(&self, fingerprint: &str) -> Option<CacheEntry<V>> {
        let now = Instant::now();
        let slot = self.entries.get(fingerprint)?;
        match slot.value() {
            Slot::Ready {
                value,
                created_at,
                expires_at,
            } if *expires_at > now => Some(CacheEntry {
                fingerprint: fingerprint.to_string(),
                value: value.clone(),
                created_at: *created_at,
                expires_at: *expires_at,
            }),
            _ => None,
        }
    }

    /// 移除单个指纹（包括进行中的标记）
    pub fn invalidate(&self, fingerprint: &str) {
        self.entries.remove(fingerprint);
    }

    /// 清空所有条目和进行中的标记
    ///
    /// 清空前启动的计算完成后不会再写回缓存
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// 删除过期条目和已失效的计算标记，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot {
            Slot::Ready { expires_at, .. } => *expires_at > now,
            Slot::Pending { fetch, .. } => fetch.upgrade().is_some(),
        });
        before.saturating_sub(self.entries.len())
    }

    /// 当前存储的槽位数量（含进行中的计算）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record_hit(&self) {
        if let Some(stats) = &self.stats {
            stats.record_cache_hit();
        }
    }

    fn record_miss(&self) {
        if let Some(stats) = &self.stats {
            stats.record_cache_miss();
        }
    }
}

/// 计算结束后更新槽位，只有仍属于本次计算的标记才会被替换
fn settle<V: Clone, E>(
    entries: &DashMap<String, Slot<V, E>>,
    key: String,
    generation: u64,
    ttl: Duration,
    result: &Result<V, E>,
) {
    if let Entry::Occupied(mut occupied) = entries.entry(key) {
        let owned = matches!(occupied.get(), Slot::Pending { generation: g, .. } if *g == generation);
        if !owned {
            return;
        }
        match result {
            Ok(value) if !ttl.is_zero() => {
                let now = Instant::now();
                occupied.insert(Slot::Ready {
                    value: value.clone(),
                    created_at: now,
                    expires_at: now + ttl,
                });
            }
            _ => {
                occupied.remove();
            }
        }
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
