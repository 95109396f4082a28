//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level config struct, client and logging sections
//! - [`cooldown`]: Cooldown bucket eviction policy (CooldownConfig, EvictionPolicy)

mod cooldown;
mod types;

pub use cooldown::{CooldownConfig, EvictionPolicy};
pub use types::{ClientConfig, Config, ConfigError, LogFormat, LoggingConfig};
