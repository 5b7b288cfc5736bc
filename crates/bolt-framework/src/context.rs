//! Request, response and logging handles passed to matchers and handlers.
//!
//! - [`BoltRequest`]: the inbound payload plus its transport metadata. One
//!   request is created per inbound payload and cloned cheaply into every
//!   matcher and handler that asks for it.
//! - [`RequestContext`]: identifiers extracted from the payload once, at
//!   request creation.
//! - [`BoltResponse`]: the outgoing acknowledgement.
//! - [`Logger`]: a structured-logging sink scoped to one listener.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::Span;

use bolt_core::payload::{
    extract_channel_id, extract_enterprise_id, extract_team_id, extract_user_id,
};
use bolt_core::{PayloadKind, classify};

// =============================================================================
// RequestContext
// =============================================================================

/// Identifiers extracted from an inbound payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    enterprise_id: Option<String>,
    team_id: Option<String>,
    user_id: Option<String>,
    channel_id: Option<String>,
    kind: Option<PayloadKind>,
}

impl RequestContext {
    /// Extracts the identifiers carried by `body`.
    pub fn from_body(body: &Value) -> Self {
        Self {
            enterprise_id: extract_enterprise_id(body).map(str::to_owned),
            team_id: extract_team_id(body).map(str::to_owned),
            user_id: extract_user_id(body).map(str::to_owned),
            channel_id: extract_channel_id(body).map(str::to_owned),
            kind: classify(body),
        }
    }

    pub fn enterprise_id(&self) -> Option<&str> {
        self.enterprise_id.as_deref()
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    /// The unique payload kind, or `None` when unrecognized.
    pub fn kind(&self) -> Option<PayloadKind> {
        self.kind
    }
}

// =============================================================================
// BoltRequest
// =============================================================================

/// An inbound payload together with its raw text and headers.
///
/// Cloning is cheap: all fields are reference counted. Nothing reachable from
/// a request is mutable, so the same request can be handed to any number of
/// matchers concurrently.
#[derive(Clone)]
pub struct BoltRequest {
    body: Arc<Value>,
    raw_body: Arc<str>,
    headers: Arc<HashMap<String, Vec<String>>>,
    context: Arc<RequestContext>,
}

impl BoltRequest {
    /// Creates a request from an already-decoded payload.
    pub fn new(body: Value) -> Self {
        let raw_body: Arc<str> = body.to_string().into();
        Self::with_raw(body, raw_body)
    }

    /// Decodes `raw` as JSON and creates a request from it.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        let body = serde_json::from_str(raw)?;
        Ok(Self::with_raw(body, raw.into()))
    }

    fn with_raw(body: Value, raw_body: Arc<str>) -> Self {
        let context = RequestContext::from_body(&body);
        Self {
            body: Arc::new(body),
            raw_body,
            headers: Arc::new(HashMap::new()),
            context: Arc::new(context),
        }
    }

    /// Attaches transport headers (builder pattern). Names are stored lowercased.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            map.entry(name.as_ref().to_ascii_lowercase())
                .or_default()
                .push(value.into());
        }
        self.headers = Arc::new(map);
        self
    }

    /// The decoded payload.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// A shared handle to the decoded payload.
    pub fn body_arc(&self) -> Arc<Value> {
        Arc::clone(&self.body)
    }

    /// The payload text as received.
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Returns the first value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn context_arc(&self) -> Arc<RequestContext> {
        Arc::clone(&self.context)
    }
}

impl fmt::Debug for BoltRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoltRequest")
            .field("kind", &self.context.kind())
            .field("team_id", &self.context.team_id())
            .field("body_len", &self.raw_body.len())
            .finish()
    }
}

// =============================================================================
// BoltResponse
// =============================================================================

/// The outgoing acknowledgement for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, Vec<String>>,
}

impl BoltResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// An empty `200` acknowledgement.
    pub fn ok() -> Self {
        Self::new(200, "")
    }

    /// A `200` response with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200, body).with_header("content-type", "text/plain;charset=utf-8")
    }

    /// A `200` response with a JSON body.
    pub fn json(body: &Value) -> Self {
        Self::new(200, body.to_string())
            .with_header("content-type", "application/json;charset=utf-8")
    }

    /// The response sent when no listener matched a request.
    pub fn not_found() -> Self {
        Self::new(404, "unhandled request")
    }

    pub fn internal_error() -> Self {
        Self::new(500, "")
    }

    /// Appends a header value (builder pattern).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl Default for BoltResponse {
    fn default() -> Self {
        Self::ok()
    }
}

// =============================================================================
// Logger
// =============================================================================

/// A structured-logging sink scoped to one listener.
///
/// Events emitted through a `Logger` are recorded inside its span, so they
/// carry the listener name and nest under the active dispatch span.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    span: Span,
}

impl Logger {
    /// Creates a logger whose span is a child of the current span.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            span: tracing::debug_span!("listener", listener = %name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Runs `f` with this logger's span entered.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }

    pub fn trace(&self, message: &str) {
        self.in_scope(|| tracing::trace!(listener = %self.name, "{message}"));
    }

    pub fn debug(&self, message: &str) {
        self.in_scope(|| tracing::debug!(listener = %self.name, "{message}"));
    }

    pub fn info(&self, message: &str) {
        self.in_scope(|| tracing::info!(listener = %self.name, "{message}"));
    }

    pub fn warn(&self, message: &str) {
        self.in_scope(|| tracing::warn!(listener = %self.name, "{message}"));
    }

    pub fn error(&self, message: &str) {
        self.in_scope(|| tracing::error!(listener = %self.name, "{message}"));
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_extracts_context() {
        let req = BoltRequest::new(json!({
            "command": "/deploy",
            "team_id": "T1",
            "user_id": "U1",
            "channel_id": "C1"
        }));
        assert_eq!(req.context().team_id(), Some("T1"));
        assert_eq!(req.context().user_id(), Some("U1"));
        assert_eq!(req.context().channel_id(), Some("C1"));
        assert_eq!(req.context().kind(), Some(PayloadKind::SlashCommand));
    }

    #[test]
    fn test_request_from_json_str_keeps_raw_text() {
        let raw = r#"{"type": "view_closed", "view": {"callback_id": "v"}}"#;
        let req = BoltRequest::from_json_str(raw).unwrap();
        assert_eq!(req.raw_body(), raw);
        assert_eq!(req.context().kind(), Some(PayloadKind::ViewClosed));
        assert!(BoltRequest::from_json_str("not json").is_err());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = BoltRequest::new(json!({})).with_headers([
            ("X-Slack-Retry-Num", "1"),
            ("x-slack-retry-num", "2"),
        ]);
        assert_eq!(req.header("x-slack-retry-num"), Some("1"));
        assert_eq!(req.header("X-SLACK-RETRY-NUM"), Some("1"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn test_response_constructors() {
        assert_eq!(BoltResponse::ok().status, 200);
        assert!(BoltResponse::ok().body.is_empty());

        let not_found = BoltResponse::not_found();
        assert_eq!(not_found.status, 404);
        assert_eq!(not_found.body, "unhandled request");
        assert!(!not_found.is_success());

        let json = BoltResponse::json(&json!({"ok": true}));
        assert_eq!(json.body, r#"{"ok":true}"#);
        assert_eq!(
            json.headers.get("content-type").map(Vec::as_slice),
            Some(&["application/json;charset=utf-8".to_string()][..])
        );
    }

    #[test]
    fn test_logger_name() {
        let logger = Logger::new("approve-button");
        assert_eq!(logger.name(), "approve-button");
        logger.debug("message emitted without a subscriber");
    }
}
