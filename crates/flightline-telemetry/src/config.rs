//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Lines retained by a `MemoryLogSink` built from this config
    pub memory_log_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "flightline".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            memory_log_capacity: 1024,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FL_SERVICE_NAME`: Service name (default: flightline)
    /// - `FL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `FL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `FL_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `FL_MEMORY_LOG_CAPACITY`: Memory sink capacity (default: 1024)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("FL_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("FL_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("FL_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("FL_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            memory_log_capacity: lookup("FL_MEMORY_LOG_CAPACITY")
                .and_then(|v| v.parse().ok())
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.memory_log_capacity),
        }
    }

    /// Create configuration for one component of the workspace.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("flightline-{}", component);
        config
    }
}
