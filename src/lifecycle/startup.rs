//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table: warm from the cache file, or compiled from definitions
//! - Fall back to compiling when the cache is missing, stale or unreadable
//! - Refresh the cache after a cold compile
//!
//! # Design Decisions
//! - Fail fast: template and configuration errors are fatal
//! - Cache problems are never fatal; they cost a recompile
//! - The finished table is immutable; reloads build a new one

use std::fs;
use std::path::Path;

use crate::config::schema::{RouterConfig, RoutingConfig, RouteConfig};
use crate::observability::metrics;
use crate::routing::cache::{read_cache_file, write_cache_file};
use crate::routing::{AliasRegistry, Callback, RouteResult, RouteTable};

/// Where a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Cache,
    Compiled,
}

impl TableSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableSource::Cache => "cache",
            TableSource::Compiled => "compiled",
        }
    }
}

/// A ready-to-serve table.
#[derive(Debug)]
pub struct BuiltTable {
    pub table: RouteTable,
    pub source: TableSource,
}

/// Compile a table from raw definitions.
pub fn compile_table(router: &RoutingConfig, routes: &[RouteConfig]) -> RouteResult<RouteTable> {
    let mut table = RouteTable::new(router.table_options());
    table.set_home_route(Callback::parse(&router.home))?;
    table.set_error_route(Callback::parse(&router.error))?;

    for route in routes {
        table.add_route(&route.path, Callback::parse(&route.callback))?;
    }
    Ok(table)
}

/// Build the alias registry from the `[aliases]` table.
pub fn alias_registry(config: &RouterConfig) -> AliasRegistry {
    config
        .aliases
        .iter()
        .map(|(name, target)| (name.clone(), Callback::parse(target)))
        .collect()
}

/// Whether the cache file is at least as new as the config file.
///
/// Missing metadata on either side counts as stale.
pub fn cache_is_fresh(cache_path: &Path, config_path: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(cache_path), modified(config_path)) {
        (Some(cache), Some(config)) => cache >= config,
        _ => false,
    }
}

/// Build the table for `config`.
///
/// With `use_cache`, a readable cache at `router.cache_path` is loaded
/// without compiling anything. Otherwise, or when the cache is rejected, the
/// definitions are compiled and the cache is rewritten.
pub fn build_table(config: &RouterConfig, use_cache: bool) -> RouteResult<BuiltTable> {
    let cache_path = config.router.cache_path.as_deref().map(Path::new);

    if let (true, Some(path)) = (use_cache, cache_path) {
        match read_cache_file(path) {
            Ok(Some(blob)) => match RouteTable::from_cache(&blob, config.router.table_options()) {
                Ok(table) => {
                    tracing::info!(path = ?path, routes = table.len(), "Route table loaded from cache");
                    metrics::record_table_build(TableSource::Cache.as_str(), table.len());
                    return Ok(BuiltTable {
                        table,
                        source: TableSource::Cache,
                    });
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Discarding unusable route cache");
                    metrics::record_cache_rejected();
                }
            },
            Ok(None) => tracing::debug!(path = ?path, "No route cache yet"),
            Err(e) => tracing::warn!(path = ?path, error = %e, "Failed to read route cache"),
        }
    }

    let table = compile_table(&config.router, &config.routes)?;
    tracing::info!(routes = table.len(), "Route table compiled from definitions");
    metrics::record_table_build(TableSource::Compiled.as_str(), table.len());

    if let Some(path) = cache_path {
        match table.export_full_cache() {
            Ok(blob) => {
                if let Err(e) = write_cache_file(path, &blob) {
                    tracing::warn!(path = ?path, error = %e, "Failed to write route cache");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Route table cannot be cached"),
        }
    }

    Ok(BuiltTable {
        table,
        source: TableSource::Compiled,
    })
}
