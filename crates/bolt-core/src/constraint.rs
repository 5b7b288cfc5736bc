//! Constraint language for listener registration.
//!
//! A [`Constraint`] is what a handler author writes when registering a
//! listener: a literal id, a compiled pattern, or a structured set of named
//! fields. Builders resolve the shape exactly once, at registration time.
//!
//! # Example
//!
//! ```rust
//! use bolt_core::{Constraint, ConstraintFields, StringMatcher};
//!
//! let literal: Constraint = "approve_button".into();
//! let pattern = Constraint::pattern(r"^approve_\d+$").unwrap();
//! let structured: Constraint = ConstraintFields::new()
//!     .with("type", "message")
//!     .with_null("subtype")
//!     .into();
//! # let _ = (literal, pattern, structured, StringMatcher::literal("x"));
//! ```

use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::error::{BoltError, BoltResult};

/// Key under which a JSON-declared constraint carries a regular expression.
pub const REGEX_KEY: &str = "regex";

// =============================================================================
// StringMatcher
// =============================================================================

/// A literal string or compiled pattern compared against a single payload field.
#[derive(Debug, Clone)]
pub enum StringMatcher {
    /// Exact equality.
    Literal(String),
    /// Unanchored search.
    Pattern(Regex),
}

impl StringMatcher {
    /// Creates a literal matcher.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Compiles `source` into a pattern matcher.
    pub fn pattern(source: &str) -> BoltResult<Self> {
        Regex::new(source)
            .map(Self::Pattern)
            .map_err(|err| BoltError::invalid_pattern(source, &err))
    }

    /// Tests `input` against this matcher.
    pub fn is_match(&self, input: &str) -> bool {
        match self {
            Self::Literal(expected) => input == expected,
            Self::Pattern(regex) => regex.is_match(input),
        }
    }

    /// Returns the literal value, if this is a literal matcher.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Pattern(_) => None,
        }
    }

    /// Decodes a JSON value: a string is a literal, `{"regex": "..."}` is a pattern.
    pub fn from_json(value: &Value) -> BoltResult<Self> {
        match value {
            Value::String(literal) => Ok(Self::literal(literal.as_str())),
            Value::Object(obj) if obj.len() == 1 => match obj.get(REGEX_KEY) {
                Some(Value::String(source)) => Self::pattern(source),
                _ => Err(invalid_type(value)),
            },
            _ => Err(invalid_type(value)),
        }
    }
}

impl From<&str> for StringMatcher {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for StringMatcher {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<Regex> for StringMatcher {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl fmt::Display for StringMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value:?}"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

// =============================================================================
// ConstraintFields
// =============================================================================

/// The ordered field map of a structured constraint.
///
/// A field may be present with a `null` value, which is distinct from being
/// absent: for events, `subtype: null` means "must not carry a subtype".
#[derive(Debug, Clone, Default)]
pub struct ConstraintFields {
    entries: Vec<(String, Option<StringMatcher>)>,
}

impl ConstraintFields {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to a literal or pattern (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StringMatcher>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Sets `key` to an explicit `null` (builder pattern).
    pub fn with_null(mut self, key: impl Into<String>) -> Self {
        self.insert(key, None);
        self
    }

    /// Sets `key`, replacing any previous value while keeping its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<StringMatcher>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns `true` if `key` is present, even with a `null` value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Returns `Some(value)` if `key` is present; the inner `None` is an explicit `null`.
    pub fn get(&self, key: &str) -> Option<Option<&StringMatcher>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    /// Returns the matcher stored at `key`, treating absence and `null` alike.
    pub fn matcher(&self, key: &str) -> Option<&StringMatcher> {
        self.get(key).flatten()
    }

    /// Returns the literal stored at `key`, if any.
    pub fn literal(&self, key: &str) -> Option<&str> {
        self.matcher(key).and_then(StringMatcher::as_literal)
    }

    /// Iterates over the field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decodes a JSON object; each value must be a string, `null` or `{"regex": "..."}`.
    pub fn from_json(value: &Value) -> BoltResult<Self> {
        let obj = value.as_object().ok_or_else(|| invalid_type(value))?;
        let mut fields = Self::new();
        for (key, field) in obj {
            let matcher = match field {
                Value::Null => None,
                other => Some(StringMatcher::from_json(other)?),
            };
            fields.insert(key.as_str(), matcher);
        }
        Ok(fields)
    }
}

impl fmt::Display for ConstraintFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Some(matcher) => write!(f, "{key}: {matcher}")?,
                None => write!(f, "{key}: null")?,
            }
        }
        f.write_str("}")
    }
}

// =============================================================================
// Constraint
// =============================================================================

/// A listener constraint in one of its three shapes.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Exact id match.
    Literal(String),
    /// Unanchored pattern search on the id.
    Pattern(Regex),
    /// Named fields selecting a more specific matcher.
    Structured(ConstraintFields),
}

impl Constraint {
    /// Compiles `source` into a pattern constraint.
    pub fn pattern(source: &str) -> BoltResult<Self> {
        Regex::new(source)
            .map(Self::Pattern)
            .map_err(|err| BoltError::invalid_pattern(source, &err))
    }

    /// Returns the literal/pattern form, or `None` for structured constraints.
    pub fn as_string_matcher(&self) -> Option<StringMatcher> {
        match self {
            Self::Literal(value) => Some(StringMatcher::Literal(value.clone())),
            Self::Pattern(regex) => Some(StringMatcher::Pattern(regex.clone())),
            Self::Structured(_) => None,
        }
    }

    /// Decodes a declarative (JSON or TOML-derived) constraint.
    ///
    /// - a string is a literal;
    /// - an object whose only key is `regex` is a pattern;
    /// - any other object is a structured constraint.
    ///
    /// Every other JSON type fails with [`BoltError::InvalidConstraintType`].
    pub fn from_json(value: &Value) -> BoltResult<Self> {
        match value {
            Value::String(literal) => Ok(Self::Literal(literal.clone())),
            Value::Object(obj) if obj.len() == 1 && obj.contains_key(REGEX_KEY) => {
                match StringMatcher::from_json(value)? {
                    StringMatcher::Pattern(regex) => Ok(Self::Pattern(regex)),
                    StringMatcher::Literal(literal) => Ok(Self::Literal(literal)),
                }
            }
            Value::Object(_) => ConstraintFields::from_json(value).map(Self::Structured),
            other => Err(invalid_type(other)),
        }
    }
}

impl From<&str> for Constraint {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Constraint {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<Regex> for Constraint {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl From<StringMatcher> for Constraint {
    fn from(matcher: StringMatcher) -> Self {
        match matcher {
            StringMatcher::Literal(value) => Self::Literal(value),
            StringMatcher::Pattern(regex) => Self::Pattern(regex),
        }
    }
}

impl From<ConstraintFields> for Constraint {
    fn from(fields: ConstraintFields) -> Self {
        Self::Structured(fields)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value:?}"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            Self::Structured(fields) => fields.fmt(f),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_type(value: &Value) -> BoltError {
    BoltError::InvalidConstraintType {
        value: value.to_string(),
        kind: json_kind(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_matcher_literal_is_exact() {
        let matcher = StringMatcher::literal("approve");
        assert!(matcher.is_match("approve"));
        assert!(!matcher.is_match("approve_1"));
        assert!(!matcher.is_match("Approve"));
    }

    #[test]
    fn test_string_matcher_pattern_is_unanchored() {
        let matcher = StringMatcher::pattern("prove").unwrap();
        assert!(matcher.is_match("approve_1"));
        assert!(!matcher.is_match("reject"));
    }

    #[test]
    fn test_fields_distinguish_null_from_absent() {
        let fields = ConstraintFields::new().with("type", "message").with_null("subtype");
        assert!(fields.contains("subtype"));
        assert!(matches!(fields.get("subtype"), Some(None)));
        assert!(fields.get("block_id").is_none());
        assert_eq!(fields.literal("type"), Some("message"));
    }

    #[test]
    fn test_fields_insert_replaces_in_place() {
        let fields = ConstraintFields::new()
            .with("type", "a")
            .with("callback_id", "b")
            .with("type", "c");
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["type", "callback_id"]);
        assert_eq!(fields.literal("type"), Some("c"));
    }

    #[test]
    fn test_display_renders_shapes() {
        let fields = ConstraintFields::new()
            .with("type", "message")
            .with_null("subtype");
        assert_eq!(fields.to_string(), r#"{type: "message", subtype: null}"#);
        assert_eq!(Constraint::from("x").to_string(), r#""x""#);
        assert_eq!(Constraint::pattern("^a").unwrap().to_string(), "/^a/");
    }

    #[test]
    fn test_from_json_shapes() {
        assert!(matches!(
            Constraint::from_json(&json!("/deploy")).unwrap(),
            Constraint::Literal(ref s) if s == "/deploy"
        ));
        assert!(matches!(
            Constraint::from_json(&json!({"regex": "^btn_"})).unwrap(),
            Constraint::Pattern(_)
        ));
        let structured =
            Constraint::from_json(&json!({"type": "message", "subtype": null})).unwrap();
        match structured {
            Constraint::Structured(fields) => {
                assert_eq!(fields.literal("type"), Some("message"));
                assert!(matches!(fields.get("subtype"), Some(None)));
            }
            other => panic!("expected structured constraint, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_nested_pattern_field() {
        let constraint =
            Constraint::from_json(&json!({"action_id": {"regex": "^a"}, "block_id": "b"})).unwrap();
        let Constraint::Structured(fields) = constraint else {
            panic!("expected structured constraint");
        };
        assert!(fields.matcher("action_id").unwrap().is_match("abc"));
    }

    #[test]
    fn test_from_json_rejects_other_types() {
        for value in [json!(1), json!(true), json!(null), json!(["a"])] {
            let err = Constraint::from_json(&value).unwrap_err();
            assert!(matches!(err, BoltError::InvalidConstraintType { .. }), "{value}");
        }
        let err = Constraint::from_json(&json!({"callback_id": 5})).unwrap_err();
        assert!(matches!(err, BoltError::InvalidConstraintType { kind: "number", .. }));
    }

    #[test]
    fn test_from_json_reports_bad_regex() {
        let err = Constraint::from_json(&json!({"regex": "("})).unwrap_err();
        assert!(matches!(err, BoltError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
