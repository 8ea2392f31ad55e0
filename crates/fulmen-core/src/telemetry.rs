//! Abstract logger and metrics hooks consumed by the catalog, the schema
//! registry, and the foundry detector.
//!
//! The core is not coupled to any observability API: both traits are no-ops
//! when unset, and sinks must never panic out of a core path. A
//! [`TracingLogger`] adapter is provided for hosts already on the `tracing`
//! facade.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;

/// Counter incremented on every successful foundry catalog lookup.
pub const FOUNDRY_LOOKUP_COUNT: &str = "foundry_lookup_count";
/// Histogram of catalog traversal latency in milliseconds.
pub const PATHFINDER_FIND_MS: &str = "pathfinder_find_ms";
/// Counter incremented when the walker skips an entry for policy reasons.
pub const PATHFINDER_SECURITY_WARNINGS: &str = "pathfinder_security_warnings";

/// Log level for structured events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Structured key-value event sink.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, event: &str, fields: &[(&str, &str)]);
}

/// Counter and histogram sink.
pub trait MetricsSink: Send + Sync {
    fn counter(&self, name: &'static str, value: u64);
    fn histogram(&self, name: &'static str, value: f64);
}

/// Silent defaults. Used wherever a consumer does not supply sinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Logger for NoopTelemetry {
    fn log(&self, _level: LogLevel, _event: &str, _fields: &[(&str, &str)]) {}
}

impl MetricsSink for NoopTelemetry {
    fn counter(&self, _name: &'static str, _value: u64) {}
    fn histogram(&self, _name: &'static str, _value: f64) {}
}

/// Adapter forwarding events to the `tracing` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, event: &str, fields: &[(&str, &str)]) {
        let rendered = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        match level {
            LogLevel::Debug => tracing::debug!(event, fields = %rendered),
            LogLevel::Info => tracing::info!(event, fields = %rendered),
            LogLevel::Warn => tracing::warn!(event, fields = %rendered),
            LogLevel::Error => tracing::error!(event, fields = %rendered),
        }
    }
}

/// Shared handle pair passed into components that observe.
#[derive(Clone)]
pub struct Telemetry {
    pub logger: Arc<dyn Logger>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl Telemetry {
    pub fn disabled() -> Self {
        Self {
            logger: Arc::new(NoopTelemetry),
            metrics: Arc::new(NoopTelemetry),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}

/// In-memory recording sink for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    counters: Mutex<Vec<(&'static str, u64)>>,
    histograms: Mutex<Vec<(&'static str, f64)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .expect("recording sink poisoned")
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .sum()
    }

    pub fn histogram_samples(&self, name: &str) -> Vec<f64> {
        self.histograms
            .lock()
            .expect("recording sink poisoned")
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl MetricsSink for RecordingSink {
    fn counter(&self, name: &'static str, value: u64) {
        self.counters
            .lock()
            .expect("recording sink poisoned")
            .push((name, value));
    }

    fn histogram(&self, name: &'static str, value: f64) {
        self.histograms
            .lock()
            .expect("recording sink poisoned")
            .push((name, value));
    }
}
