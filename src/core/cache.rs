//! Bounded memoization for category strategies.
//!
//! Keys are coarse fingerprints of the inputs: net worth, salary and loan
//! balance are quantized, so two series that differ only below the
//! quantization step share a cached result. Entries expire after a TTL and,
//! once the cache is full, the least-accessed entry is evicted (oldest first
//! on ties).

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::error::AdviceResult;
use super::strategies::{Strategy, StrategyContext, StrategyKind};
use super::types::AdviceItem;

const NET_WORTH_STEP: f64 = 10_000.0;
const SALARY_STEP: f64 = 1_000.0;
const LOAN_STEP: f64 = 10_000.0;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CacheSettings {
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        Self { capacity, ttl_secs }
    }

    /// Debt and investment inputs move faster than spending and salary.
    pub fn for_strategy(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Expense | StrategyKind::Income => Self::new(100, 900),
            StrategyKind::Debt
            | StrategyKind::Offset
            | StrategyKind::InvestmentContribution
            | StrategyKind::Allocation
            | StrategyKind::PersonSpecific => Self::new(50, 300),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub access_count: u64,
}

pub struct BoundedCache<K, V, C = SystemClock> {
    entries: HashMap<K, CacheEntry<V>>,
    capacity: usize,
    ttl: Duration,
    clock: C,
    stats: CacheStats,
}

impl<K, V> BoundedCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<K, V, C> BoundedCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(settings: CacheSettings, clock: C) -> Self {
        Self {
            entries: HashMap::with_capacity(settings.capacity),
            capacity: settings.capacity.max(1),
            ttl: settings.ttl(),
            clock,
            stats: CacheStats::default(),
        }
    }

    /// Returns a clone of a live entry; an expired entry is purged and
    /// reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(entry) => now.saturating_duration_since(entry.inserted_at) > self.ttl,
        };
        if expired {
            self.entries.remove(key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.access_count += 1;
        self.stats.hits += 1;
        Some(entry.value.clone())
    }

    pub fn set(&mut self, key: K, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: self.clock.now(),
                access_count: 0,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.access_count
                    .cmp(&b.access_count)
                    .then(a.inserted_at.cmp(&b.inserted_at))
            })
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

fn quantize(value: f64, step: f64) -> i64 {
    if value.is_finite() {
        (value / step).round() as i64
    } else {
        i64::MIN
    }
}

/// Lossy cache key for one strategy over one projection.
pub fn fingerprint(kind: StrategyKind, ctx: &StrategyContext<'_>) -> String {
    let snapshots = ctx.snapshots;
    let net_worth_at = |index: usize| {
        snapshots
            .get(index)
            .map_or(0, |s| quantize(s.net_worth, NET_WORTH_STEP))
    };
    let head = net_worth_at(0);
    let mid = net_worth_at(snapshots.len() / 2);
    let tail = net_worth_at(snapshots.len().saturating_sub(1));

    let params = ctx.params;
    let salary = quantize(params.household_income(), SALARY_STEP);
    let loan = snapshots
        .first()
        .map_or(0, |s| quantize(s.loan_balance, LOAN_STEP));

    let mut key = format!(
        "{}:{}:{head}:{mid}:{tail}:{salary}:{loan}:{}:{}",
        kind.label(),
        snapshots.len(),
        params.current_age,
        params.retirement_age
    );
    for person in &params.people {
        key.push_str(&format!(
            ":{}@{}-{}",
            person.id, person.current_age, person.retirement_age
        ));
    }
    key
}

/// Boxes a closure as a strategy, pinning its signature to the strategy contract.
pub fn boxed_strategy<F>(strategy: F) -> Box<Strategy>
where
    F: Fn(&StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> + Send + Sync + 'static,
{
    Box::new(strategy)
}

/// A pure strategy with its own bounded cache in front of it.
pub struct CachedStrategy {
    kind: StrategyKind,
    strategy: Box<Strategy>,
    cache: BoundedCache<String, Vec<AdviceItem>, Box<dyn Clock>>,
}

impl CachedStrategy {
    pub fn new(kind: StrategyKind, settings: CacheSettings) -> Self {
        Self::with_strategy(kind, settings, boxed_strategy(kind.strategy()))
    }

    pub fn with_strategy(kind: StrategyKind, settings: CacheSettings, strategy: Box<Strategy>) -> Self {
        Self::with_parts(kind, settings, strategy, Box::new(SystemClock))
    }

    pub fn with_parts(
        kind: StrategyKind,
        settings: CacheSettings,
        strategy: Box<Strategy>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            kind,
            strategy,
            cache: BoundedCache::with_clock(settings, clock),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// Cached advice for the fingerprint of `ctx`, computing it on a miss.
    /// Failed computations are not cached.
    pub fn fetch_or_compute(&mut self, ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
        let key = fingerprint(self.kind, ctx);
        if let Some(advice) = self.cache.get(&key) {
            tracing::trace!(strategy = self.kind.label(), "advice cache hit");
            return Ok(advice);
        }
        let advice = (self.strategy)(ctx)?;
        self.cache.set(key, advice.clone());
        Ok(advice)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Clock for Box<dyn Clock> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
