//! Route template compilation.
//!
//! # Template Syntax
//! ```text
//! user/$id:int/profile
//! ^^^^ ^^^^^^^ ^^^^^^^
//! base  typed   static
//! ```
//! - Segments are separated by `/`; leading and trailing separators are ignored
//! - `$name` binds any non-separator run
//! - `$name:type` restricts the capture (`str`/`string`, `int`/`integer`, `float`)
//!
//! # Design Decisions
//! - One anchored, case-insensitive regex per template
//! - A single trailing separator is tolerated by the matcher
//! - The first segment must be literal; it is the bucket key
//! - Segment count is bounded to reject oversized templates

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::routing::error::CompileError;

/// Default upper bound on segments per template.
pub const DEFAULT_MAX_SEGMENTS: usize = 15;

/// Whether a segment is a literal or binds a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Static,
    Dynamic,
}

/// Capture restriction for a dynamic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Untyped: any run of non-separator characters.
    #[default]
    None,
    Str,
    Int,
    Float,
}

impl ValueType {
    /// Parse a `:type` suffix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "str" | "string" => Some(ValueType::Str),
            "int" | "integer" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            _ => None,
        }
    }

    /// Capture group for this type.
    fn fragment(self) -> &'static str {
        match self {
            ValueType::None => "([^/]+)",
            ValueType::Str => r"([A-Za-z0-9\-_.+~?!]+)",
            ValueType::Int => "([0-9]+)",
            ValueType::Float => "([0-9.]+)",
        }
    }
}

/// One parsed template segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    pub kind: SegmentKind,
    /// Literal text for static segments, parameter name for dynamic ones.
    pub name: String,
    #[serde(default)]
    pub value_type: ValueType,
}

impl SegmentDescriptor {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Static,
            name: text.into(),
            value_type: ValueType::None,
        }
    }

    pub fn param(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            kind: SegmentKind::Dynamic,
            name: name.into(),
            value_type,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == SegmentKind::Dynamic
    }

    fn fragment(&self) -> String {
        match self.kind {
            SegmentKind::Static => regex::escape(&self.name),
            SegmentKind::Dynamic => self.value_type.fragment().to_string(),
        }
    }
}

/// Output of [`SegmentCompiler::compile`].
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub base: String,
    pub segments: Vec<SegmentDescriptor>,
    pub matcher: Regex,
}

/// Turns route templates into segment lists and matchers.
#[derive(Debug, Clone, Copy)]
pub struct SegmentCompiler {
    max_segments: usize,
}

impl Default for SegmentCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEGMENTS)
    }
}

impl SegmentCompiler {
    pub fn new(max_segments: usize) -> Self {
        Self { max_segments }
    }

    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Parse a template into descriptors without building the matcher.
    pub fn parse(&self, template: &str) -> Result<Vec<SegmentDescriptor>, CompileError> {
        let raw: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
        if raw.is_empty() {
            return Err(CompileError::Empty);
        }
        if raw.len() > self.max_segments {
            return Err(CompileError::TooManySegments {
                count: raw.len(),
                limit: self.max_segments,
            });
        }

        let mut segments: Vec<SegmentDescriptor> = Vec::with_capacity(raw.len());
        for (position, part) in raw.iter().enumerate() {
            let Some(var) = part.strip_prefix('$') else {
                segments.push(SegmentDescriptor::literal(*part));
                continue;
            };

            if position == 0 {
                return Err(CompileError::LeadingDynamic(template.to_string()));
            }

            let (name, value_type) = match var.split_once(':') {
                Some((name, suffix)) => {
                    let ty = ValueType::from_suffix(suffix).ok_or_else(|| {
                        CompileError::UnsupportedType {
                            name: name.to_string(),
                            ty: suffix.to_string(),
                        }
                    })?;
                    (name, ty)
                }
                None => (var, ValueType::None),
            };

            if name.is_empty() {
                return Err(CompileError::EmptyParamName {
                    template: template.to_string(),
                    position,
                });
            }
            if segments.iter().any(|s| s.is_dynamic() && s.name == name) {
                return Err(CompileError::DuplicateParam {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }

            segments.push(SegmentDescriptor::param(name, value_type));
        }

        Ok(segments)
    }

    /// Compile a template into base, descriptors and matcher.
    pub fn compile(&self, template: &str) -> Result<CompiledTemplate, CompileError> {
        let segments = self.parse(template)?;
        let matcher = build_matcher(&segments)?;
        let base = segments[0].name.clone();

        tracing::trace!(template, base = %base, matcher = matcher.as_str(), "Compiled route template");

        Ok(CompiledTemplate {
            base,
            segments,
            matcher,
        })
    }
}

/// Build the anchored matcher for a descriptor list.
///
/// An empty list yields the root matcher used by the home and error routes.
pub fn build_matcher(segments: &[SegmentDescriptor]) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("(?i)^");
    for segment in segments {
        pattern.push('/');
        pattern.push_str(&segment.fragment());
    }
    pattern.push_str("/?$");
    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_template() {
        let compiled = SegmentCompiler::default()
            .compile("user/$id:int/profile")
            .unwrap();

        assert_eq!(compiled.base, "user");
        assert_eq!(
            compiled.segments,
            vec![
                SegmentDescriptor::literal("user"),
                SegmentDescriptor::param("id", ValueType::Int),
                SegmentDescriptor::literal("profile"),
            ]
        );
        assert_eq!(compiled.matcher.as_str(), "(?i)^/user/([0-9]+)/profile/?$");
    }

    #[test]
    fn test_type_suffix_aliases() {
        let compiler = SegmentCompiler::default();
        let segs = compiler.parse("a/$x:string/$y:integer/$z:FLOAT/$w").unwrap();
        let types: Vec<ValueType> = segs.iter().map(|s| s.value_type).collect();
        assert_eq!(
            types,
            vec![
                ValueType::None,
                ValueType::Str,
                ValueType::Int,
                ValueType::Float,
                ValueType::None
            ]
        );
    }

    #[test]
    fn test_leading_and_trailing_separators_ignored() {
        let compiler = SegmentCompiler::default();
        assert_eq!(
            compiler.parse("/blog//$slug/").unwrap(),
            compiler.parse("blog/$slug").unwrap()
        );
    }

    #[test]
    fn test_rejects_invalid_templates() {
        let compiler = SegmentCompiler::default();

        assert!(matches!(compiler.compile(""), Err(CompileError::Empty)));
        assert!(matches!(compiler.compile("///"), Err(CompileError::Empty)));
        assert!(matches!(
            compiler.compile("$id/profile"),
            Err(CompileError::LeadingDynamic(_))
        ));
        assert!(matches!(
            compiler.compile("user/$:int"),
            Err(CompileError::EmptyParamName { position: 1, .. })
        ));
        assert!(matches!(
            compiler.compile("user/$id/$id"),
            Err(CompileError::DuplicateParam { .. })
        ));

        match compiler.compile("user/$id:uuid") {
            Err(CompileError::UnsupportedType { name, ty }) => {
                assert_eq!(name, "id");
                assert_eq!(ty, "uuid");
            }
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_segment_bound() {
        let compiler = SegmentCompiler::new(3);
        assert!(compiler.compile("a/b/c").is_ok());
        assert!(matches!(
            compiler.compile("a/b/c/d"),
            Err(CompileError::TooManySegments { count: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_literal_is_escaped() {
        let compiled = SegmentCompiler::default().compile("files/a.b+c").unwrap();
        assert!(compiled.matcher.is_match("/files/a.b+c"));
        assert!(!compiled.matcher.is_match("/files/aXbbc"));
    }

    #[test]
    fn test_root_matcher() {
        let root = build_matcher(&[]).unwrap();
        assert!(root.is_match("/"));
        assert!(!root.is_match("/x"));
    }
}
