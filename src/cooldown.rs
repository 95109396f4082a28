//! Per-command cooldowns.
//!
//! A [`CooldownMapping`] owns one token bucket per key. Keys come from a
//! [`KeyResolver`]: either a built-in [`BucketType`] applied to the context,
//! or a custom (possibly async) resolver.
//!
//! # Architecture
//!
//! Buckets are `governor` GCRA limiters with a burst of `rate` that refill
//! one use every `per`. Once `rate` uses land inside a window, the next one
//! is refused until `per` has passed since the first, and a bucket is only
//! back to full after `rate * per` without use. The check and the charge are
//! a single atomic step inside governor, so two concurrent invocations can
//! never both observe "under limit" for the same key, and a rejected attempt
//! is never recorded as usage. Charging happens under the map's entry guard,
//! so a concurrent prune cannot drop a bucket between lookup and charge.

use crate::config::EvictionPolicy;
use crate::dispatch::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Built-in bucket keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BucketType {
    /// One bucket shared by everyone.
    #[default]
    Global,
    User,
    Channel,
    /// Keyed by server; DMs fall back to the channel.
    Server,
    /// Keyed by (server, user); DMs fall back to the user.
    Member,
}

impl BucketType {
    pub fn resolve(&self, ctx: &Context) -> String {
        let message = &ctx.message;
        match self {
            Self::Global => "global".to_string(),
            Self::User => message.author.id.clone(),
            Self::Channel => message.channel_id.clone(),
            Self::Server => message
                .server_id
                .clone()
                .unwrap_or_else(|| message.channel_id.clone()),
            Self::Member => match &message.server_id {
                Some(server) => format!("{server}:{}", message.author.id),
                None => message.author.id.clone(),
            },
        }
    }
}

/// A user-supplied bucket key resolver.
#[async_trait]
pub trait ResolveKey: Send + Sync {
    async fn resolve(&self, ctx: &Context) -> String;
}

struct KeyFn<F>(F);

#[async_trait]
impl<F> ResolveKey for KeyFn<F>
where
    F: Fn(&Context) -> String + Send + Sync,
{
    async fn resolve(&self, ctx: &Context) -> String {
        (self.0)(ctx)
    }
}

/// Wrap a synchronous closure as a [`KeyResolver`].
pub fn key_fn<F>(f: F) -> KeyResolver
where
    F: Fn(&Context) -> String + Send + Sync + 'static,
{
    KeyResolver::Custom(Arc::new(KeyFn(f)))
}

/// Where a command's bucket key comes from.
#[derive(Clone)]
pub enum KeyResolver {
    Bucket(BucketType),
    Custom(Arc<dyn ResolveKey>),
}

impl KeyResolver {
    pub async fn resolve(&self, ctx: &Context) -> String {
        match self {
            Self::Bucket(bucket) => bucket.resolve(ctx),
            Self::Custom(resolver) => resolver.resolve(ctx).await,
        }
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::Bucket(BucketType::Global)
    }
}

impl From<BucketType> for KeyResolver {
    fn from(bucket: BucketType) -> Self {
        Self::Bucket(bucket)
    }
}

impl fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket(bucket) => f.debug_tuple("Bucket").field(bucket).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// `rate` uses per `per`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    rate: NonZeroU32,
    per: Duration,
}

impl Cooldown {
    /// A rate of zero is treated as one.
    pub fn new(rate: u32, per: Duration) -> Self {
        Self {
            rate: NonZeroU32::new(rate).unwrap_or(nonzero!(1u32)),
            per,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate.get()
    }

    pub fn per(&self) -> Duration {
        self.per
    }

    /// Idle time after which a bucket is as good as new.
    pub fn replenish_time(&self) -> Duration {
        self.per.saturating_mul(self.rate.get())
    }

    fn quota(&self) -> Quota {
        match Quota::with_period(self.per.max(Duration::from_nanos(1))) {
            Some(quota) => quota.allow_burst(self.rate),
            None => Quota::per_second(self.rate),
        }
    }
}

/// The limiter for one key.
pub struct Bucket {
    limiter: DefaultDirectRateLimiter,
    last_used: Mutex<Instant>,
}

impl Bucket {
    fn new(cooldown: &Cooldown) -> Self {
        Self {
            limiter: RateLimiter::direct(cooldown.quota()),
            last_used: Mutex::new(Instant::now()),
        }
    }

    /// Charge one use. Returns how long to wait if the bucket is exhausted;
    /// a rejected call leaves the bucket untouched.
    pub fn update_rate_limit(&self) -> Option<Duration> {
        match self.limiter.check() {
            Ok(()) => {
                *self.last_used.lock() = Instant::now();
                None
            }
            Err(not_until) => Some(not_until.wait_time_from(DefaultClock::default().now())),
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.lock().elapsed()
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("idle_for", &self.idle_for())
            .finish_non_exhaustive()
    }
}

/// Key → bucket map for one command.
#[derive(Debug)]
pub struct CooldownMapping {
    cooldown: Cooldown,
    buckets: DashMap<String, Arc<Bucket>>,
    /// Overrides the client-wide policy when set.
    eviction: Option<EvictionPolicy>,
}

impl CooldownMapping {
    pub fn new(cooldown: Cooldown) -> Self {
        Self {
            cooldown,
            buckets: DashMap::new(),
            eviction: None,
        }
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = Some(eviction);
        self
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// The bucket for `key`, created on first use.
    pub fn get_bucket(&self, key: &str) -> Arc<Bucket> {
        if let Some(bucket) = self.buckets.get(key) {
            return Arc::clone(bucket.value());
        }
        let bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Bucket::new(&self.cooldown)));
        Arc::clone(bucket.value())
    }

    /// Charge `key`, returning the retry delay on rejection.
    ///
    /// The shard guard is held across the charge; `prune` needs the same
    /// shard for writing.
    pub fn update_rate_limit(&self, key: &str) -> Option<Duration> {
        if let Some(bucket) = self.buckets.get(key) {
            return bucket.update_rate_limit();
        }
        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Bucket::new(&self.cooldown)))
            .update_rate_limit()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop buckets the active policy allows to go. Returns how many went.
    ///
    /// `fallback` applies when the mapping has no policy of its own.
    pub fn prune(&self, fallback: EvictionPolicy) -> usize {
        let policy = self.eviction.unwrap_or(fallback);
        if let EvictionPolicy::Capacity { max_buckets } = policy {
            if self.buckets.len() <= max_buckets {
                return 0;
            }
        }
        let Some(threshold) = policy.idle_threshold(self.cooldown.replenish_time()) else {
            return 0;
        };

        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.idle_for() < threshold);
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            debug!(removed, remaining = self.buckets.len(), "pruned cooldown buckets");
        }
        removed
    }
}
