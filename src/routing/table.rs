//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes, bucketed by base segment
//! - Resolve a request path to a route plus bound parameters
//! - Hold the distinguished home and error routes
//! - Bulk export / import through the cache format
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) bucket lookup via HashMap; unknown bases are rejected without a scan
//! - Linear scan within a bucket, in stored order
//! - Explicit NotFound outcome rather than an error for unmatched paths

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::routing::alias::Callback;
use crate::routing::cache;
use crate::routing::entry::{Outcome, RouteEntry, RouteMatch, STATUS_PARAM};
use crate::routing::error::{CacheFormatError, RouteError, RouteResult};
use crate::routing::path::{first_segment, normalize};
use crate::routing::segment::{SegmentCompiler, DEFAULT_MAX_SEGMENTS};

/// Status injected on the error route when nothing matched.
pub const NOT_FOUND_STATUS: u16 = 404;

/// Precedence between routes that share a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Append: routes registered earlier are tried first.
    #[default]
    FirstWins,
    /// Prepend: routes registered later shadow earlier ones.
    LastWins,
}

/// Table construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Prefix stripped from request paths before lookup.
    pub base_url: Option<String>,
    pub priority: Priority,
    pub max_segments: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            priority: Priority::FirstWins,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

/// The router: base-indexed buckets plus the home and error slots.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    options: TableOptions,
    compiler: SegmentCompiler,
    buckets: HashMap<String, Vec<RouteEntry>>,
    home: Option<RouteEntry>,
    error: Option<RouteEntry>,
}

impl RouteTable {
    /// Create an empty table. Home and error routes must be set before resolving.
    pub fn new(options: TableOptions) -> Self {
        Self {
            compiler: SegmentCompiler::new(options.max_segments),
            options,
            buckets: HashMap::new(),
            home: None,
            error: None,
        }
    }

    /// Rebuild a table from a blob produced by [`RouteTable::export_full_cache`].
    ///
    /// Entries keep their stored order; the priority policy only applies to
    /// routes added afterwards.
    pub fn from_cache(blob: &str, options: TableOptions) -> RouteResult<Self> {
        let document = cache::decode(blob)?;
        if document.priority != options.priority {
            tracing::warn!(
                cached = ?document.priority,
                configured = ?options.priority,
                "Cache was written with a different priority policy; keeping cached order"
            );
        }

        let mut table = Self::new(options);
        for route in &document.routes {
            let entry = table.admit(RouteEntry::import(route)?)?;
            table.bucket_mut(&entry).push(entry);
        }
        table.home = Some(RouteEntry::import(&document.home)?);
        table.error = Some(RouteEntry::import(&document.error)?);

        tracing::debug!(routes = table.len(), buckets = table.buckets.len(), "Route table loaded from cache");
        Ok(table)
    }

    /// Options the table was built with.
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Compiler used by [`RouteTable::add_route`].
    pub fn compiler(&self) -> &SegmentCompiler {
        &self.compiler
    }

    /// Compile and store a route. `"/"` fills the home slot.
    pub fn add_route(&mut self, template: &str, callback: Callback) -> RouteResult<&RouteEntry> {
        if template.trim_matches('/').is_empty() && !template.is_empty() {
            return self.set_home_route(callback);
        }
        let entry = RouteEntry::compile(template, callback, &self.compiler)?;
        Ok(self.insert(entry))
    }

    /// Store a previously exported route without recompiling it.
    pub fn add_cached_route(&mut self, blob: &str) -> RouteResult<&RouteEntry> {
        let entry = self.admit(RouteEntry::import(blob)?)?;
        Ok(self.insert(entry))
    }

    /// Bucketed entries need a base and must respect the segment bound.
    fn admit(&self, entry: RouteEntry) -> Result<RouteEntry, CacheFormatError> {
        let count = entry.segments().len();
        if count == 0 {
            return Err(CacheFormatError::InvalidField {
                field: "segments",
                reason: "home/error shaped entries cannot be bucketed".into(),
            });
        }
        if count > self.compiler.max_segments() {
            return Err(CacheFormatError::InvalidField {
                field: "segments",
                reason: format!(
                    "{} segments exceed the limit of {}",
                    count,
                    self.compiler.max_segments()
                ),
            });
        }
        Ok(entry)
    }

    /// Replace the route served for the root path.
    pub fn set_home_route(&mut self, callback: Callback) -> RouteResult<&RouteEntry> {
        let entry: &RouteEntry = self.home.insert(RouteEntry::special(callback)?);
        Ok(entry)
    }

    /// Replace the route served when nothing matches.
    pub fn set_error_route(&mut self, callback: Callback) -> RouteResult<&RouteEntry> {
        let entry: &RouteEntry = self.error.insert(RouteEntry::special(callback)?);
        Ok(entry)
    }

    /// Configured home route, or a configuration error.
    pub fn home_route(&self) -> RouteResult<&RouteEntry> {
        self.home.as_ref().ok_or(RouteError::Configuration("home"))
    }

    /// Configured error route, or a configuration error.
    pub fn error_route(&self) -> RouteResult<&RouteEntry> {
        self.error.as_ref().ok_or(RouteError::Configuration("error"))
    }

    // Keys fold case the same way the `(?i)` matchers do.
    fn bucket_mut(&mut self, entry: &RouteEntry) -> &mut Vec<RouteEntry> {
        self.buckets
            .entry(entry.base().to_lowercase())
            .or_default()
    }

    fn insert(&mut self, entry: RouteEntry) -> &RouteEntry {
        let priority = self.options.priority;
        let bucket = self.bucket_mut(&entry);
        match priority {
            Priority::FirstWins => {
                bucket.push(entry);
                &bucket[bucket.len() - 1]
            }
            Priority::LastWins => {
                bucket.insert(0, entry);
                &bucket[0]
            }
        }
    }

    /// Resolve a raw request path.
    ///
    /// Only a missing home or error route is an error. An unmatched path
    /// yields the error route with `status = 404`.
    pub fn resolve(&self, raw_path: &str) -> RouteResult<RouteMatch<'_>> {
        let path = normalize(raw_path, self.options.base_url.as_deref());

        let result = match first_segment(&path) {
            None => RouteMatch::special(self.home_route()?, Outcome::Home),
            Some(first) => match self.buckets.get(&first.to_lowercase()) {
                None => self.not_found()?,
                Some(bucket) => match bucket.iter().find_map(|entry| entry.verify(&path)) {
                    Some(found) => found,
                    None => self.not_found()?,
                },
            },
        };

        tracing::debug!(
            path = %path,
            outcome = result.outcome().as_str(),
            callback = %result.entry().callback(),
            "Resolved request path"
        );
        metrics::record_resolution(result.outcome().as_str());

        Ok(result)
    }

    fn not_found(&self) -> RouteResult<RouteMatch<'_>> {
        let mut result = RouteMatch::special(self.error_route()?, Outcome::NotFound);
        result.set_param(STATUS_PARAM, NOT_FOUND_STATUS.to_string());
        Ok(result)
    }

    /// Serialize every route plus the home and error routes.
    pub fn export_full_cache(&self) -> RouteResult<String> {
        let mut keys: Vec<&String> = self.buckets.keys().collect();
        keys.sort();
        let routes = keys
            .into_iter()
            .flat_map(|k| self.buckets[k].iter())
            .map(|e| e.export().to_string())
            .collect();

        let document = cache::CacheDocument {
            format: cache::CACHE_FORMAT.to_string(),
            version: cache::CACHE_VERSION,
            priority: self.options.priority,
            routes,
            home: self.home_route()?.export().to_string(),
            error: self.error_route()?.export().to_string(),
        };
        Ok(cache::encode(&document)?)
    }

    /// Number of bucketed routes (home and error excluded).
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// True when no bucketed routes exist.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets keyed by lowercased base, entries in scan order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[RouteEntry])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Entries for one base, in scan order.
    pub fn bucket(&self, base: &str) -> Option<&[RouteEntry]> {
        self.buckets
            .get(&base.to_lowercase())
            .map(Vec::as_slice)
    }
}
