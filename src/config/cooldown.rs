//! Cooldown bucket housekeeping.

use serde::Deserialize;
use std::time::Duration;

/// When idle cooldown buckets may be dropped.
///
/// Only buckets that would behave like a fresh one are ever removed, so no
/// policy can cut an active cooldown short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep every bucket for the life of the process.
    #[default]
    Never,
    /// Drop buckets unused for `seconds` (never less than the time a bucket
    /// takes to refill completely).
    Idle { seconds: u64 },
    /// Once a mapping holds more than `max_buckets`, drop replenished buckets.
    Capacity { max_buckets: usize },
}

impl EvictionPolicy {
    /// The idle time after which a bucket that refills completely in
    /// `replenish` may go.
    pub fn idle_threshold(&self, replenish: Duration) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::Idle { seconds } => Some(Duration::from_secs(*seconds).max(replenish)),
            Self::Capacity { .. } => Some(replenish),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// Default policy for every command without its own.
    #[serde(default)]
    pub eviction: EvictionPolicy,
    /// How often the binary runs `prune_cooldowns` (default: 300).
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            eviction: EvictionPolicy::Never,
            prune_interval_secs: default_prune_interval(),
        }
    }
}

fn default_prune_interval() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_threshold_never_below_replenish_time() {
        let per = Duration::from_secs(60);
        assert_eq!(EvictionPolicy::Never.idle_threshold(per), None);
        assert_eq!(
            EvictionPolicy::Idle { seconds: 5 }.idle_threshold(per),
            Some(per)
        );
        assert_eq!(
            EvictionPolicy::Idle { seconds: 600 }.idle_threshold(per),
            Some(Duration::from_secs(600))
        );
        assert_eq!(
            EvictionPolicy::Capacity { max_buckets: 10 }.idle_threshold(per),
            Some(per)
        );
    }

    #[test]
    fn test_capacity_policy_parses() {
        let config: CooldownConfig =
            toml::from_str(r#"eviction = { policy = "capacity", max_buckets = 1000 }"#).unwrap();
        assert_eq!(config.eviction, EvictionPolicy::Capacity { max_buckets: 1000 });
        assert_eq!(config.prune_interval_secs, 300);
    }
}
