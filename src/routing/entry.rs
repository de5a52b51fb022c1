//! Compiled routes and per-request match results.
//!
//! # Responsibilities
//! - Hold a compiled route (base, descriptors, matcher, callback)
//! - Verify a normalized path and bind its parameters
//! - Export to / import from the portable cache form
//!
//! # Design Decisions
//! - `RouteEntry` is immutable while a table serves lookups
//! - Bound parameters live on the returned `RouteMatch`, never on the entry,
//!   so one table can serve concurrent requests
//! - The exported form is memoized; every setter clears it

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::routing::alias::{AliasResolver, Callback, HandlerRegistry};
use crate::routing::error::{CacheFormatError, CompileError, RouteResult};
use crate::routing::segment::{
    build_matcher, SegmentCompiler, SegmentDescriptor, SegmentKind, ValueType,
};

/// Version tag written into every exported entry.
pub const ENTRY_FORMAT_VERSION: u64 = 1;

/// Parameter carrying the HTTP status on the error route.
pub const STATUS_PARAM: &str = "status";

/// A compiled route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    base: String,
    segments: Vec<SegmentDescriptor>,
    matcher: Regex,
    callback: Callback,
    serialized: OnceLock<String>,
}

impl PartialEq for RouteEntry {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.segments == other.segments
            && self.matcher.as_str() == other.matcher.as_str()
            && self.callback == other.callback
    }
}

impl RouteEntry {
    /// Compile a template into a route.
    pub fn compile(
        template: &str,
        callback: Callback,
        compiler: &SegmentCompiler,
    ) -> Result<Self, CompileError> {
        let compiled = compiler.compile(template)?;
        Ok(Self {
            base: compiled.base,
            segments: compiled.segments,
            matcher: compiled.matcher,
            callback,
            serialized: OnceLock::new(),
        })
    }

    /// Root-shaped route used for the home and error slots.
    pub fn special(callback: Callback) -> Result<Self, CompileError> {
        Ok(Self {
            base: String::new(),
            segments: Vec::new(),
            matcher: build_matcher(&[])?,
            callback,
            serialized: OnceLock::new(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// Names of the parameters this route binds, in segment order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| s.is_dynamic())
            .map(|s| s.name.as_str())
    }

    /// Template text reconstructed from the descriptors.
    pub fn template(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s.kind {
                SegmentKind::Static => s.name.clone(),
                SegmentKind::Dynamic => match s.value_type {
                    ValueType::None => format!("${}", s.name),
                    ValueType::Str => format!("${}:str", s.name),
                    ValueType::Int => format!("${}:int", s.name),
                    ValueType::Float => format!("${}:float", s.name),
                },
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn set_callback(&mut self, callback: Callback) {
        self.callback = callback;
        self.serialized = OnceLock::new();
    }

    /// Replace the route shape with a freshly compiled template.
    pub fn recompile(&mut self, template: &str, compiler: &SegmentCompiler) -> Result<(), CompileError> {
        let compiled = compiler.compile(template)?;
        self.base = compiled.base;
        self.segments = compiled.segments;
        self.matcher = compiled.matcher;
        self.serialized = OnceLock::new();
        Ok(())
    }

    /// Match a normalized path, binding parameters on success.
    pub fn verify(&self, path: &str) -> Option<RouteMatch<'_>> {
        let captures = self.matcher.captures(path)?;

        let mut groups = captures.iter().skip(1);
        let mut params = Vec::with_capacity(self.segments.len());
        for segment in self.segments.iter().filter(|s| s.is_dynamic()) {
            let value = groups.next().flatten()?;
            params.push((segment.name.clone(), value.as_str().to_string()));
        }

        Some(RouteMatch {
            entry: self,
            params,
            outcome: Outcome::Matched,
        })
    }

    /// Portable form: `{v, base, segments, matcher, callback}` as JSON.
    pub fn export(&self) -> &str {
        self.serialized.get_or_init(|| {
            json!({
                "v": ENTRY_FORMAT_VERSION,
                "base": self.base,
                "segments": self.segments,
                "matcher": self.matcher.as_str(),
                "callback": self.callback,
            })
            .to_string()
        })
    }

    /// Rebuild a route from its exported form without re-parsing a template.
    pub fn import(blob: &str) -> Result<Self, CacheFormatError> {
        let value: Value = serde_json::from_str(blob)?;
        let entry = Self::from_value(&value)?;
        let _ = entry.serialized.set(blob.to_string());
        Ok(entry)
    }

    fn from_value(value: &Value) -> Result<Self, CacheFormatError> {
        let object = value.as_object().ok_or(CacheFormatError::InvalidField {
            field: "entry",
            reason: "expected an object".into(),
        })?;

        let version = object
            .get("v")
            .ok_or(CacheFormatError::MissingField("v"))?
            .as_u64()
            .ok_or_else(|| invalid("v", "expected an unsigned integer"))?;
        if version != ENTRY_FORMAT_VERSION {
            return Err(CacheFormatError::Version {
                found: version,
                expected: ENTRY_FORMAT_VERSION,
            });
        }

        let base = object
            .get("base")
            .ok_or(CacheFormatError::MissingField("base"))?
            .as_str()
            .ok_or_else(|| invalid("base", "expected a string"))?
            .to_string();

        let segments: Vec<SegmentDescriptor> = serde_json::from_value(
            object
                .get("segments")
                .ok_or(CacheFormatError::MissingField("segments"))?
                .clone(),
        )
        .map_err(|e| invalid("segments", e))?;

        let pattern = object
            .get("matcher")
            .ok_or(CacheFormatError::MissingField("matcher"))?
            .as_str()
            .ok_or_else(|| invalid("matcher", "expected a string"))?;

        let callback: Callback = serde_json::from_value(
            object
                .get("callback")
                .ok_or(CacheFormatError::MissingField("callback"))?
                .clone(),
        )
        .map_err(|e| invalid("callback", e))?;

        match segments.first() {
            Some(first) if first.kind != SegmentKind::Static || first.name != base => {
                return Err(invalid("base", "does not match the first literal segment"));
            }
            None if !base.is_empty() => {
                return Err(invalid("base", "set on a route without segments"));
            }
            _ => {}
        }

        let matcher = Regex::new(pattern)?;
        let dynamic = segments.iter().filter(|s| s.is_dynamic()).count();
        if matcher.captures_len() != dynamic + 1 {
            return Err(invalid(
                "matcher",
                format!(
                    "has {} capture groups for {} parameters",
                    matcher.captures_len() - 1,
                    dynamic
                ),
            ));
        }

        Ok(Self {
            base,
            segments,
            matcher,
            callback,
            serialized: OnceLock::new(),
        })
    }
}

fn invalid(field: &'static str, reason: impl ToString) -> CacheFormatError {
    CacheFormatError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Root path served by the home route.
    Home,
    /// A bucket entry verified.
    Matched,
    /// Error route; carries a `status` parameter.
    NotFound,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "home",
            Outcome::Matched => "matched",
            Outcome::NotFound => "not_found",
        }
    }
}

/// Result of one resolution: the route plus parameters bound for this request.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    entry: &'a RouteEntry,
    params: Vec<(String, String)>,
    outcome: Outcome,
}

impl<'a> RouteMatch<'a> {
    pub(crate) fn special(entry: &'a RouteEntry, outcome: Outcome) -> Self {
        Self {
            entry,
            params: Vec::new(),
            outcome,
        }
    }

    pub fn entry(&self) -> &'a RouteEntry {
        self.entry
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_not_found(&self) -> bool {
        self.outcome == Outcome::NotFound
    }

    /// Bound parameters in segment order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a bound parameter.
    pub fn param_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get_param(name).and_then(|v| v.parse().ok())
    }

    /// Set or replace a parameter.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    /// Status code injected on the error route.
    pub fn status(&self) -> Option<u16> {
        self.param_as(STATUS_PARAM)
    }

    /// Invoke the route's callback with this match.
    pub fn fire_callback<T>(
        &self,
        handlers: &HandlerRegistry<T>,
        aliases: &dyn AliasResolver,
    ) -> RouteResult<T> {
        let handler = handlers.handler_for(&self.entry.callback, aliases)?;
        Ok(handler(self))
    }
}
