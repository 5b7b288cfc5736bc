//! Explicit argument resolution for matchers and handlers.
//!
//! Every predicate and handler declares up front which pieces of the live
//! request it needs, as a list of [`ArgKind`]s. At call time only those
//! entries are resolved into a [`ResolvedArgs`] table, and each parameter is
//! then pulled out of the table through [`FromArgs`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::Value;
//! use bolt_framework::{Logger, sync_matcher};
//!
//! // Declares Body and Logger; Request, Response and Context are never built.
//! let matcher = sync_matcher("has-text", |body: Arc<Value>, logger: Logger| {
//!     logger.debug("checking text");
//!     body.get("text").is_some()
//! });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{BoltRequest, BoltResponse, Logger, RequestContext};
use crate::error::{ExtractError, ExtractResult};

/// The pieces of live context a predicate or handler can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    /// The decoded payload.
    Body,
    /// Identifiers extracted from the payload.
    Context,
    /// A logger scoped to the listener.
    Logger,
    /// The full inbound request.
    Request,
    /// The outgoing response, when one exists.
    Response,
}

impl ArgKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Context => "context",
            Self::Logger => "logger",
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resolved argument.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Body(Arc<Value>),
    Context(Arc<RequestContext>),
    Logger(Logger),
    Request(BoltRequest),
    Response(BoltResponse),
}

/// The lookup table of arguments resolved for one call.
#[derive(Debug, Clone, Default)]
pub struct ResolvedArgs {
    values: HashMap<ArgKind, ArgValue>,
}

impl ResolvedArgs {
    /// Resolves exactly the `required` kinds from the live request.
    ///
    /// `Response` is only present when a response was supplied; asking for it
    /// otherwise makes the matching [`FromArgs`] call fail with
    /// [`ExtractError::Unavailable`].
    pub fn resolve(
        required: &[ArgKind],
        request: &BoltRequest,
        response: Option<&BoltResponse>,
        listener: &str,
    ) -> Self {
        let mut values = HashMap::with_capacity(required.len());
        for kind in required {
            if values.contains_key(kind) {
                continue;
            }
            let value = match kind {
                ArgKind::Body => ArgValue::Body(request.body_arc()),
                ArgKind::Context => ArgValue::Context(request.context_arc()),
                ArgKind::Logger => ArgValue::Logger(Logger::new(listener)),
                ArgKind::Request => ArgValue::Request(request.clone()),
                ArgKind::Response => match response {
                    Some(response) => ArgValue::Response(response.clone()),
                    None => continue,
                },
            };
            values.insert(*kind, value);
        }
        Self { values }
    }

    /// Returns the resolved value for `kind`.
    pub fn get(&self, kind: ArgKind) -> ExtractResult<&ArgValue> {
        self.values.get(&kind).ok_or(ExtractError::Unavailable(kind))
    }

    pub fn contains(&self, kind: ArgKind) -> bool {
        self.values.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A type that can be pulled out of a [`ResolvedArgs`] table.
///
/// Types implementing this trait can be used directly as predicate and
/// handler parameters.
pub trait FromArgs: Sized {
    /// Appends the kinds this type needs to `out`.
    fn declare(out: &mut Vec<ArgKind>);

    /// Extracts this type from the resolved table.
    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self>;
}

impl FromArgs for Arc<Value> {
    fn declare(out: &mut Vec<ArgKind>) {
        out.push(ArgKind::Body);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        match args.get(ArgKind::Body)? {
            ArgValue::Body(body) => Ok(Arc::clone(body)),
            _ => Err(ExtractError::Unavailable(ArgKind::Body)),
        }
    }
}

impl FromArgs for Arc<RequestContext> {
    fn declare(out: &mut Vec<ArgKind>) {
        out.push(ArgKind::Context);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        match args.get(ArgKind::Context)? {
            ArgValue::Context(context) => Ok(Arc::clone(context)),
            _ => Err(ExtractError::Unavailable(ArgKind::Context)),
        }
    }
}

impl FromArgs for Logger {
    fn declare(out: &mut Vec<ArgKind>) {
        out.push(ArgKind::Logger);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        match args.get(ArgKind::Logger)? {
            ArgValue::Logger(logger) => Ok(logger.clone()),
            _ => Err(ExtractError::Unavailable(ArgKind::Logger)),
        }
    }
}

impl FromArgs for BoltRequest {
    fn declare(out: &mut Vec<ArgKind>) {
        out.push(ArgKind::Request);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        match args.get(ArgKind::Request)? {
            ArgValue::Request(request) => Ok(request.clone()),
            _ => Err(ExtractError::Unavailable(ArgKind::Request)),
        }
    }
}

impl FromArgs for BoltResponse {
    fn declare(out: &mut Vec<ArgKind>) {
        out.push(ArgKind::Response);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        match args.get(ArgKind::Response)? {
            ArgValue::Response(response) => Ok(response.clone()),
            _ => Err(ExtractError::Unavailable(ArgKind::Response)),
        }
    }
}

/// Optional parameters resolve to `None` instead of failing.
impl<T: FromArgs> FromArgs for Option<T> {
    fn declare(out: &mut Vec<ArgKind>) {
        T::declare(out);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        Ok(T::from_args(args).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> BoltRequest {
        BoltRequest::new(json!({"command": "/deploy", "team_id": "T1"}))
    }

    #[test]
    fn test_resolves_only_declared_kinds() {
        let args = ResolvedArgs::resolve(&[ArgKind::Body], &request(), None, "l");
        assert_eq!(args.len(), 1);
        assert!(args.contains(ArgKind::Body));
        assert!(!args.contains(ArgKind::Logger));
        assert!(!args.contains(ArgKind::Request));
    }

    #[test]
    fn test_duplicate_kinds_resolve_once() {
        let args = ResolvedArgs::resolve(
            &[ArgKind::Body, ArgKind::Body, ArgKind::Context],
            &request(),
            None,
            "l",
        );
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_extract_body_and_context() {
        let args =
            ResolvedArgs::resolve(&[ArgKind::Body, ArgKind::Context], &request(), None, "l");
        let body = Arc::<Value>::from_args(&args).unwrap();
        assert_eq!(body["command"], "/deploy");
        let context = Arc::<RequestContext>::from_args(&args).unwrap();
        assert_eq!(context.team_id(), Some("T1"));
    }

    #[test]
    fn test_missing_response_is_unavailable() {
        let args = ResolvedArgs::resolve(&[ArgKind::Response], &request(), None, "l");
        assert!(args.is_empty());
        let err = BoltResponse::from_args(&args).unwrap_err();
        assert!(matches!(err, ExtractError::Unavailable(ArgKind::Response)));
    }

    #[test]
    fn test_option_swallows_unavailable() {
        let args = ResolvedArgs::resolve(&[ArgKind::Response], &request(), None, "l");
        assert!(Option::<BoltResponse>::from_args(&args).unwrap().is_none());

        let response = BoltResponse::text("hi");
        let args = ResolvedArgs::resolve(&[ArgKind::Response], &request(), Some(&response), "l");
        assert_eq!(
            Option::<BoltResponse>::from_args(&args).unwrap(),
            Some(response)
        );
    }

    #[test]
    fn test_logger_carries_listener_name() {
        let args = ResolvedArgs::resolve(&[ArgKind::Logger], &request(), None, "deploy");
        assert_eq!(Logger::from_args(&args).unwrap().name(), "deploy");
    }
}
