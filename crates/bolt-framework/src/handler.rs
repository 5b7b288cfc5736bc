//! Predicate and handler traits for plain functions.
//!
//! Predicates and handlers are ordinary functions whose parameters implement
//! [`FromArgs`]. Blanket implementations for every arity (axum style) derive
//! the declared [`ArgKind`] list from the parameter types, so nothing is
//! inspected at runtime.
//!
//! - [`PredicateFn`]: `Fn(T1, T2, ..) -> bool`, run to completion.
//! - [`AsyncPredicateFn`]: `Fn(T1, T2, ..) -> impl Future<Output = bool>`.
//! - [`Handler`]: `Fn(T1, T2, ..) -> impl Future<Output = impl IntoResponse>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::Value;
//! use bolt_framework::{BoltRequest, Logger};
//!
//! fn is_admin(request: BoltRequest) -> bool {
//!     request.context().user_id() == Some("U_ADMIN")
//! }
//!
//! async fn approve(body: Arc<Value>, logger: Logger) -> String {
//!     logger.info("approved");
//!     format!("approved by {}", body["user"]["id"])
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::error;

use crate::context::{BoltRequest, BoltResponse};
use crate::error::ExtractResult;
use crate::extractor::{ArgKind, FromArgs, ResolvedArgs};

// ============================================================================
// IntoResponse
// ============================================================================

/// A type that can be returned from a handler.
pub trait IntoResponse: Send + 'static {
    fn into_response(self) -> BoltResponse;
}

/// `()` acknowledges with an empty `200`.
impl IntoResponse for () {
    fn into_response(self) -> BoltResponse {
        BoltResponse::ok()
    }
}

impl IntoResponse for String {
    fn into_response(self) -> BoltResponse {
        BoltResponse::text(self)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> BoltResponse {
        BoltResponse::text(self)
    }
}

impl IntoResponse for Value {
    fn into_response(self) -> BoltResponse {
        BoltResponse::json(&self)
    }
}

impl IntoResponse for BoltResponse {
    fn into_response(self) -> BoltResponse {
        self
    }
}

/// `None` acknowledges with an empty `200`.
impl<T: IntoResponse> IntoResponse for Option<T> {
    fn into_response(self) -> BoltResponse {
        match self {
            Some(t) => t.into_response(),
            None => BoltResponse::ok(),
        }
    }
}

/// On `Err` the error is logged and a `500` is returned.
impl<T: IntoResponse, E: fmt::Display + Send + 'static> IntoResponse for Result<T, E> {
    fn into_response(self) -> BoltResponse {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => {
                error!("Handler error: {e}");
                BoltResponse::internal_error()
            }
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A synchronous predicate with explicitly declared arguments.
pub trait PredicateFn<T>: Clone + Send + Sync + 'static {
    /// The argument kinds this predicate reads, in parameter order.
    fn declared_args() -> Vec<ArgKind>;

    /// Extracts the parameters from `args` and runs the predicate.
    fn call_with(&self, args: &ResolvedArgs) -> ExtractResult<bool>;
}

/// An asynchronous predicate with explicitly declared arguments.
pub trait AsyncPredicateFn<T>: Clone + Send + Sync + 'static {
    /// The argument kinds this predicate reads, in parameter order.
    fn declared_args() -> Vec<ArgKind>;

    /// Extracts the parameters from `args` and starts the predicate.
    ///
    /// Nothing runs until the returned future is polled.
    fn call_with(&self, args: &ResolvedArgs) -> ExtractResult<BoxFuture<'static, bool>>;
}

/// A listener handler with explicitly declared arguments.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The argument kinds this handler reads, in parameter order.
    fn declared_args() -> Vec<ArgKind>;

    /// Extracts the parameters from `args` and starts the handler.
    fn call_with(&self, args: &ResolvedArgs) -> ExtractResult<BoxFuture<'static, BoltResponse>>;
}

// ============================================================================
// Blanket implementations for functions
// ============================================================================

/// Generates the predicate and handler implementations for one arity.
macro_rules! impl_args_fn {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, $($ty,)*> PredicateFn<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> bool + Clone + Send + Sync + 'static,
            $( $ty: FromArgs + 'static, )*
        {
            fn declared_args() -> Vec<ArgKind> {
                let mut out = Vec::new();
                $( $ty::declare(&mut out); )*
                out
            }

            fn call_with(&self, args: &ResolvedArgs) -> ExtractResult<bool> {
                $(
                    let $ty = $ty::from_args(args)?;
                )*
                Ok((self)($($ty,)*))
            }
        }

        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, $($ty,)*> AsyncPredicateFn<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = bool> + Send + 'static,
            $( $ty: FromArgs + 'static, )*
        {
            fn declared_args() -> Vec<ArgKind> {
                let mut out = Vec::new();
                $( $ty::declare(&mut out); )*
                out
            }

            fn call_with(&self, args: &ResolvedArgs) -> ExtractResult<BoxFuture<'static, bool>> {
                $(
                    let $ty = $ty::from_args(args)?;
                )*
                Ok((self)($($ty,)*).boxed())
            }
        }

        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoResponse,
            $( $ty: FromArgs + 'static, )*
        {
            fn declared_args() -> Vec<ArgKind> {
                let mut out = Vec::new();
                $( $ty::declare(&mut out); )*
                out
            }

            fn call_with(&self, args: &ResolvedArgs) -> ExtractResult<BoxFuture<'static, BoltResponse>> {
                $(
                    let $ty = $ty::from_args(args)?;
                )*
                let fut = (self)($($ty,)*);
                Ok(async move { fut.await.into_response() }.boxed())
            }
        }
    };
}

impl_args_fn!();
impl_args_fn!(T1);
impl_args_fn!(T1, T2);
impl_args_fn!(T1, T2, T3);
impl_args_fn!(T1, T2, T3, T4);
impl_args_fn!(T1, T2, T3, T4, T5);

// ============================================================================
// BoxedHandler
// ============================================================================

type ErasedCall =
    Arc<dyn Fn(&ResolvedArgs) -> ExtractResult<BoxFuture<'static, BoltResponse>> + Send + Sync>;

/// A type-erased handler that can be stored in collections.
#[derive(Clone)]
pub struct BoxedHandler {
    declared: Arc<[ArgKind]>,
    call: ErasedCall,
}

impl BoxedHandler {
    /// Erases a handler function.
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self {
            declared: H::declared_args().into(),
            call: Arc::new(move |args| handler.call_with(args)),
        }
    }

    pub fn declared_args(&self) -> &[ArgKind] {
        &self.declared
    }

    /// Resolves the declared arguments and runs the handler to completion.
    pub async fn call(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
        listener: &str,
    ) -> ExtractResult<BoltResponse> {
        let args = ResolvedArgs::resolve(&self.declared, request, response, listener);
        let fut = (self.call)(&args)?;
        Ok(fut.await)
    }
}

impl fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedHandler")
            .field("declared", &self.declared)
            .finish()
    }
}

/// Convert a handler function into a boxed handler.
pub fn into_handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    BoxedHandler::new(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Logger;
    use crate::error::ExtractError;
    use serde_json::json;

    fn declared<H: Handler<T>, T>(_: &H) -> Vec<ArgKind> {
        H::declared_args()
    }

    #[test]
    fn test_declared_args_follow_parameter_order() {
        let handler = |_logger: Logger, _body: Arc<Value>, _resp: Option<BoltResponse>| async {};
        assert_eq!(
            declared(&handler),
            [ArgKind::Logger, ArgKind::Body, ArgKind::Response]
        );
        assert!(declared(&|| async {}).is_empty());
    }

    #[test]
    fn test_result_error_becomes_500() {
        let ok: Result<String, String> = Ok("done".into());
        assert_eq!(ok.into_response().body, "done");

        let err: Result<String, String> = Err("boom".into());
        assert_eq!(err.into_response().status, 500);
    }

    #[test]
    fn test_unit_and_none_acknowledge() {
        assert_eq!(().into_response(), BoltResponse::ok());
        assert_eq!(None::<String>.into_response(), BoltResponse::ok());
    }

    #[tokio::test]
    async fn test_boxed_handler_resolves_arguments() {
        let handler = into_handler(|body: Arc<Value>| async move {
            format!("command {}", body["command"].as_str().unwrap_or_default())
        });
        let request = BoltRequest::new(json!({"command": "/deploy"}));
        let response = handler.call(&request, None, "deploy").await.unwrap();
        assert_eq!(response.body, "command /deploy");
        assert_eq!(handler.declared_args(), [ArgKind::Body]);
    }

    #[tokio::test]
    async fn test_boxed_handler_reports_unavailable_argument() {
        let handler = into_handler(|_resp: BoltResponse| async {});
        let request = BoltRequest::new(json!({}));
        let err = handler.call(&request, None, "h").await.unwrap_err();
        assert!(matches!(err, ExtractError::Unavailable(ArgKind::Response)));
    }
}
