//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::{Priority, SegmentCompiler, TableOptions};
use crate::routing::segment::DEFAULT_MAX_SEGMENTS;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration for the HTTP host.
    pub listener: ListenerConfig,

    /// Table-wide routing settings.
    pub router: RoutingConfig,

    /// Route definitions, in registration order.
    pub routes: Vec<RouteConfig>,

    /// Alias name → callback text (`name`, `Class::method`).
    pub aliases: BTreeMap<String, String>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Table-wide routing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Prefix stripped from request paths (e.g., "/app").
    pub base_url: Option<String>,

    /// Precedence between routes sharing a base.
    pub priority: Priority,

    /// Maximum segments per template.
    pub max_segments: usize,

    /// Warm-start cache file. Written after a cold compile.
    pub cache_path: Option<String>,

    /// Callback for the root path.
    pub home: String,

    /// Callback for unmatched paths.
    pub error: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            priority: Priority::FirstWins,
            max_segments: DEFAULT_MAX_SEGMENTS,
            cache_path: None,
            home: "home".to_string(),
            error: "not_found".to_string(),
        }
    }
}

impl RoutingConfig {
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            base_url: self.base_url.clone(),
            priority: self.priority,
            max_segments: self.max_segments,
        }
    }

    pub fn compiler(&self) -> SegmentCompiler {
        SegmentCompiler::new(self.max_segments)
    }
}

/// One route definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route template, e.g. "user/$id:int/profile".
    pub path: String,

    /// Callback text: `name`, `Class::method` or `@alias`.
    pub callback: String,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            callback: callback.into(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
