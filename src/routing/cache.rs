//! Full-table cache format and persistence.
//!
//! ```text
//! {
//!   "format": "segment-router-cache",
//!   "version": 1,
//!   "priority": "first_wins",
//!   "routes": ["<entry blob>", ...],   // scan order within each bucket
//!   "home": "<entry blob>",
//!   "error": "<entry blob>"
//! }
//! ```
//!
//! Entry blobs are the strings produced by `RouteEntry::export`, kept as
//! strings so each one can be fed to `RouteTable::add_cached_route` as is.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routing::error::CacheFormatError;
use crate::routing::table::Priority;

pub const CACHE_FORMAT: &str = "segment-router-cache";
pub const CACHE_VERSION: u64 = 1;

/// Decoded cache document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDocument {
    pub format: String,
    pub version: u64,
    pub priority: Priority,
    pub routes: Vec<String>,
    pub home: String,
    pub error: String,
}

/// Serialize a cache document.
pub fn encode(document: &CacheDocument) -> Result<String, CacheFormatError> {
    Ok(serde_json::to_string(document)?)
}

/// Parse and validate a cache blob.
///
/// Every field is required; nothing is defaulted.
pub fn decode(blob: &str) -> Result<CacheDocument, CacheFormatError> {
    let value: Value = serde_json::from_str(blob)?;
    let object = value.as_object().ok_or(CacheFormatError::InvalidField {
        field: "document",
        reason: "expected an object".into(),
    })?;

    let format = required_str(object, "format")?;
    if format != CACHE_FORMAT {
        return Err(CacheFormatError::Format(format.to_string()));
    }

    let version = object
        .get("version")
        .ok_or(CacheFormatError::MissingField("version"))?
        .as_u64()
        .ok_or_else(|| invalid("version", "expected an unsigned integer"))?;
    if version != CACHE_VERSION {
        return Err(CacheFormatError::Version {
            found: version,
            expected: CACHE_VERSION,
        });
    }

    let priority: Priority = serde_json::from_value(
        object
            .get("priority")
            .ok_or(CacheFormatError::MissingField("priority"))?
            .clone(),
    )
    .map_err(|e| invalid("priority", e))?;

    let routes = object
        .get("routes")
        .ok_or(CacheFormatError::MissingField("routes"))?
        .as_array()
        .ok_or_else(|| invalid("routes", "expected an array"))?
        .iter()
        .map(|r| {
            r.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid("routes", "expected entry blobs as strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CacheDocument {
        format: format.to_string(),
        version,
        priority,
        routes,
        home: required_str(object, "home")?.to_string(),
        error: required_str(object, "error")?.to_string(),
    })
}

fn required_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, CacheFormatError> {
    object
        .get(field)
        .ok_or(CacheFormatError::MissingField(field))?
        .as_str()
        .ok_or_else(|| invalid(field, "expected a string"))
}

fn invalid(field: &'static str, reason: impl ToString) -> CacheFormatError {
    CacheFormatError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

/// Read a cache file. `Ok(None)` if it does not exist.
pub fn read_cache_file(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write a cache file atomically (temp file + rename).
pub fn write_cache_file(path: &Path, blob: &str) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(blob.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    tracing::info!(path = ?path, bytes = blob.len(), "Route cache written");
    Ok(())
}
