//! Prometheus metrics for command dispatch.
//!
//! - `command_total{command}` - Invocations by qualified command name
//! - `command_duration_seconds{command}` - Pipeline latency histogram
//! - `command_errors_total{command,error}` - Errors by command and error code
//! - `command_cooldown_rejections_total{command}` - Invocations refused by a cooldown
//! - `commands_processed_messages_total` - Messages seen by the dispatcher
//!
//! Recording before [`init`] is a no-op.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Messages handed to the dispatcher, command or not.
pub static MESSAGES_PROCESSED: OnceLock<IntCounter> = OnceLock::new();

/// Invocations by qualified command name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by command and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static COOLDOWN_REJECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Full pipeline latency by command.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Later calls keep the first set of metrics.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    if COMMAND_COUNTER.get().is_some() {
        return;
    }

    register!(MESSAGES_PROCESSED, IntCounter::new("commands_processed_messages_total", "Messages seen by the dispatcher"));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("command_total", "Command invocations by name"), &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("command_errors_total", "Command errors by name and code"), &["command", "error"]));
    register!(COOLDOWN_REJECTIONS, IntCounterVec::new(Opts::new("command_cooldown_rejections_total", "Invocations refused by a cooldown"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("command_duration_seconds", "Command pipeline latency by name")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

fn get_counter_vec(metric: &OnceLock<IntCounterVec>) -> Option<&IntCounterVec> {
    metric.get()
}

fn get_histogram_vec(metric: &OnceLock<HistogramVec>) -> Option<&HistogramVec> {
    metric.get()
}

#[inline]
pub fn record_message() {
    if let Some(c) = MESSAGES_PROCESSED.get() {
        c.inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = get_counter_vec(&COMMAND_COUNTER) {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = get_histogram_vec(&COMMAND_LATENCY) {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = get_counter_vec(&COMMAND_ERRORS) {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_cooldown_rejection(command: &str) {
    if let Some(c) = get_counter_vec(&COOLDOWN_REJECTIONS) {
        c.with_label_values(&[command]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_message();
        record_command("ping", 0.001);
        record_command_error("ping", "command_on_cooldown");
        record_cooldown_rejection("ping");

        let output = gather_metrics();
        assert!(output.contains("command_total"));
        assert!(output.contains("command_errors_total"));
        assert!(output.contains("command_cooldown_rejections_total"));
    }
}
