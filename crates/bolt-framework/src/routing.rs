//! Tower integration for listener matchers.
//!
//! Any [`BoxedMatcher`] can gate a tower service: [`MatcherPredicate`]
//! implements [`AsyncPredicate`], rejecting non-matching requests with
//! [`ListenerSkipped`]. [`on`] returns a [`ServiceBuilder`] with that filter
//! already stacked, and [`ServiceBuilderExt::handler`] finishes it with a
//! handler function.
//!
//! # Example
//!
//! ```rust,ignore
//! use bolt_framework::{on, ServiceBuilderExt, matcher_builders::command};
//! use tower::ServiceExt;
//!
//! let svc = on(command("/deploy", false)?).handler(deploy_handler);
//! let response = svc.oneshot(request).await?;
//! ```

use std::marker::PhantomData;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::filter::{AsyncFilterLayer, AsyncPredicate};
use tower::{BoxError, Layer, Service, ServiceBuilder};
use tower_layer::{Identity, Stack};

use crate::context::{BoltRequest, BoltResponse};
use crate::error::ListenerSkipped;
use crate::extractor::ResolvedArgs;
use crate::handler::Handler;
use crate::matcher::BoxedMatcher;

// ============================================================================
// MatcherPredicate
// ============================================================================

/// An [`AsyncPredicate`] that passes a request through when the matcher accepts it.
///
/// Non-matching requests fail with [`ListenerSkipped`]; matcher configuration
/// errors fail with the underlying [`BoltError`](bolt_core::BoltError).
#[derive(Clone)]
pub struct MatcherPredicate(BoxedMatcher);

impl MatcherPredicate {
    pub fn new(matcher: BoxedMatcher) -> Self {
        Self(matcher)
    }
}

impl AsyncPredicate<BoltRequest> for MatcherPredicate {
    type Future = BoxFuture<'static, Result<BoltRequest, BoxError>>;
    type Request = BoltRequest;

    fn check(&mut self, request: BoltRequest) -> Self::Future {
        let matcher = self.0.clone();
        async move {
            match matcher.matches(&request, None).await {
                Ok(true) => Ok(request),
                Ok(false) => Err(ListenerSkipped.into()),
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }
}

/// Returns `true` if `err` is the rejection produced by a [`MatcherPredicate`].
pub fn is_skipped(err: &BoxError) -> bool {
    err.is::<ListenerSkipped>()
}

// ============================================================================
// HandlerService
// ============================================================================

/// A tower [`Service`] that calls a single handler function.
pub struct HandlerService<H, T> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<H, T> HandlerService<H, T> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<H: Clone, T> Clone for HandlerService<H, T> {
    fn clone(&self) -> Self {
        Self::new(self.handler.clone())
    }
}

impl<H, T> Service<BoltRequest> for HandlerService<H, T>
where
    H: Handler<T>,
{
    type Response = BoltResponse;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<BoltResponse, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: BoltRequest) -> Self::Future {
        let declared = H::declared_args();
        let args = ResolvedArgs::resolve(&declared, &request, None, "service");
        match self.handler.call_with(&args) {
            Ok(pending) => pending.map(Ok).boxed(),
            Err(e) => futures::future::ready(Err(e.into())).boxed(),
        }
    }
}

// ============================================================================
// ServiceBuilder helpers
// ============================================================================

/// The `ServiceBuilder` returned by [`on`].
pub type MatcherServiceBuilder =
    ServiceBuilder<Stack<AsyncFilterLayer<MatcherPredicate>, Identity>>;

/// Creates a [`ServiceBuilder`] that only passes requests accepted by `matcher`.
pub fn on(matcher: BoxedMatcher) -> MatcherServiceBuilder {
    ServiceBuilder::new().layer(AsyncFilterLayer::new(MatcherPredicate::new(matcher)))
}

/// Extension trait for [`tower::ServiceBuilder`].
pub trait ServiceBuilderExt<L> {
    /// Wraps `handler` in a [`HandlerService`] and applies all stacked layers.
    fn handler<H, T>(self, handler: H) -> L::Service
    where
        H: Handler<T>,
        L: Layer<HandlerService<H, T>>;

    /// Adds a further matcher filter.
    fn matcher(
        self,
        matcher: BoxedMatcher,
    ) -> ServiceBuilder<Stack<AsyncFilterLayer<MatcherPredicate>, L>>;
}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn handler<H, T>(self, handler: H) -> L::Service
    where
        H: Handler<T>,
        L: Layer<HandlerService<H, T>>,
    {
        self.service(HandlerService::new(handler))
    }

    fn matcher(
        self,
        matcher: BoxedMatcher,
    ) -> ServiceBuilder<Stack<AsyncFilterLayer<MatcherPredicate>, L>> {
        self.layer(AsyncFilterLayer::new(MatcherPredicate::new(matcher)))
    }
}
