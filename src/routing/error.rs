//! Error taxonomy for the routing engine.
//!
//! Only malformed input or configuration produces an error. A request that
//! matches no route is a normal outcome of resolution and is reported as
//! `Outcome::NotFound` on the returned match, never through these types.

use thiserror::Error;

/// Errors raised while compiling a route template.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Template has no segments at all.
    #[error("route template is empty")]
    Empty,

    /// First segment is a variable, so the route has no base to index by.
    #[error("route template '{0}' must begin with a literal segment")]
    LeadingDynamic(String),

    /// A `$` segment without a name (`$` or `$:int`).
    #[error("route template '{template}' has an unnamed variable at segment {position}")]
    EmptyParamName { template: String, position: usize },

    /// The same variable name appears twice.
    #[error("route template '{template}' binds '{name}' more than once")]
    DuplicateParam { template: String, name: String },

    /// Unknown `:type` suffix.
    #[error("unsupported segment type '{ty}' for variable '{name}'")]
    UnsupportedType { name: String, ty: String },

    /// Template exceeds the configured segment bound.
    #[error("route template has {count} segments, limit is {limit}")]
    TooManySegments { count: usize, limit: usize },

    /// Generated matcher failed to build.
    #[error("failed to build matcher: {0}")]
    Matcher(#[from] regex::Error),
}

/// Errors raised while importing a cached route or a full cache blob.
#[derive(Debug, Error)]
pub enum CacheFormatError {
    /// Blob is not valid JSON.
    #[error("cache blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Required field absent.
    #[error("cache blob is missing required field '{0}'")]
    MissingField(&'static str),

    /// Field present but of the wrong shape.
    #[error("cache field '{field}' is malformed: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Produced by an incompatible format version.
    #[error("cache version {found} is not supported (expected {expected})")]
    Version { found: u64, expected: u64 },

    /// Document does not identify itself as a route cache.
    #[error("cache blob has unknown format tag '{0}'")]
    Format(String),

    /// Stored matcher no longer compiles.
    #[error("cached matcher is invalid: {0}")]
    Matcher(#[from] regex::Error),
}

/// Top-level error for router operations.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    CacheFormat(#[from] CacheFormatError),

    /// Home or error route requested before it was set.
    #[error("router misconfigured: {0} route is not set")]
    Configuration(&'static str),

    /// Alias callback fired but nothing is registered under that name.
    #[error("no callback registered for alias '{0}'")]
    UnresolvedAlias(String),

    /// Direct or static-method callback has no registered handler.
    #[error("no handler registered for callback '{0}'")]
    UnresolvedHandler(String),
}

/// Result type for router operations.
pub type RouteResult<T> = Result<T, RouteError>;
