//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     (template, callback)[]
//!     → segment.rs (parse segments, build matcher)
//!     → entry.rs (RouteEntry)
//!     → table.rs (bucket by base segment)
//!     → cache.rs (optional: persist full table)
//!
//! Warm Start:
//!     cache blob → cache.rs → entry.rs (import, no recompile) → table.rs
//!
//! Incoming Request (path):
//!     → path.rs (strip query, base URL, trailing separator)
//!     → table.rs (home | bucket lookup | scan)
//!     → RouteMatch (entry + bound params) or error route (status=404)
//!     → alias.rs (resolve callback, fire handler)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Bound parameters are per-request values, not route state
//! - Deterministic: same input always matches same route
//! - Registration-order precedence is an explicit `Priority` policy

pub mod alias;
pub mod cache;
pub mod entry;
pub mod error;
pub mod path;
pub mod segment;
pub mod table;

pub use alias::{AliasRegistry, AliasResolver, Callback, Handler, HandlerRegistry};
pub use entry::{Outcome, RouteEntry, RouteMatch, STATUS_PARAM};
pub use error::{CacheFormatError, CompileError, RouteError, RouteResult};
pub use segment::{SegmentCompiler, SegmentDescriptor, SegmentKind, ValueType};
pub use table::{Priority, RouteTable, TableOptions, NOT_FOUND_STATUS};
