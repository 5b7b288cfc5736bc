//! Listener matchers.
//!
//! A [`ListenerMatcher`] decides whether a listener should handle a request.
//! The dispatcher only ever sees the trait; where a matcher came from (a
//! builtin builder or a user predicate) and whether it suspends is hidden
//! behind [`ListenerMatcher::matches`].
//!
//! Two implementations share one resolution contract:
//!
//! - [`BuiltinListenerMatcher`] runs its predicate to completion inside the
//!   call and never suspends. It also exposes [`matches_sync`] for callers
//!   outside an async context.
//! - [`AsyncBuiltinListenerMatcher`] starts its predicate as a future and
//!   awaits it. Dropping the future before it completes yields no decision.
//!
//! In both cases the declared arguments are resolved from the live request
//! at call time and only that subset is handed to the predicate.
//!
//! [`matches_sync`]: BuiltinListenerMatcher::matches_sync
//!
//! # Example
//!
//! ```rust,ignore
//! use bolt_framework::{BoltRequest, async_matcher, sync_matcher};
//!
//! let from_admin = sync_matcher("from-admin", |request: BoltRequest| {
//!     request.context().user_id() == Some("U_ADMIN")
//! });
//!
//! let allowed = async_matcher("allowed", |request: BoltRequest| async move {
//!     lookup_allow_list(request.context().team_id()).await
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::trace;

use bolt_core::BoltResult;

use crate::context::{BoltRequest, BoltResponse};
use crate::error::ExtractResult;
use crate::extractor::{ArgKind, ResolvedArgs};
use crate::handler::{AsyncPredicateFn, PredicateFn};

/// The uniform calling convention for every matcher.
#[async_trait]
pub trait ListenerMatcher: Send + Sync + fmt::Debug {
    /// A human-readable name used in logs.
    fn name(&self) -> &str;

    /// The argument kinds the wrapped predicate reads.
    fn declared_args(&self) -> &[ArgKind];

    /// Returns `true` if the predicate suspends.
    fn is_async(&self) -> bool;

    /// Evaluates the matcher against a request.
    ///
    /// `Ok(false)` is an ordinary no-match. An `Err` means the predicate
    /// declared an argument the request could not supply.
    async fn matches(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
    ) -> BoltResult<bool>;
}

/// A shared, type-erased matcher.
pub type BoxedMatcher = Arc<dyn ListenerMatcher>;

type SyncCall = Arc<dyn Fn(&ResolvedArgs) -> ExtractResult<bool> + Send + Sync>;
type AsyncCall = Arc<dyn Fn(&ResolvedArgs) -> ExtractResult<BoxFuture<'static, bool>> + Send + Sync>;

// ============================================================================
// BuiltinListenerMatcher
// ============================================================================

/// A matcher that runs its predicate to completion.
#[derive(Clone)]
pub struct BuiltinListenerMatcher {
    name: Arc<str>,
    declared: Arc<[ArgKind]>,
    func: SyncCall,
}

impl BuiltinListenerMatcher {
    pub fn new<F, T>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: PredicateFn<T>,
        T: 'static,
    {
        Self {
            name: name.into(),
            declared: F::declared_args().into(),
            func: Arc::new(move |args| func.call_with(args)),
        }
    }

    /// Evaluates the matcher without suspending.
    pub fn matches_sync(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
    ) -> BoltResult<bool> {
        let args = ResolvedArgs::resolve(&self.declared, request, response, &self.name);
        let matched = (self.func)(&args)?;
        trace!(matcher = %self.name, matched, "Matcher evaluated");
        Ok(matched)
    }
}

#[async_trait]
impl ListenerMatcher for BuiltinListenerMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_args(&self) -> &[ArgKind] {
        &self.declared
    }

    fn is_async(&self) -> bool {
        false
    }

    async fn matches(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
    ) -> BoltResult<bool> {
        self.matches_sync(request, response)
    }
}

impl fmt::Debug for BuiltinListenerMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinListenerMatcher")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .finish()
    }
}

// ============================================================================
// AsyncBuiltinListenerMatcher
// ============================================================================

/// A matcher whose predicate is awaited.
#[derive(Clone)]
pub struct AsyncBuiltinListenerMatcher {
    name: Arc<str>,
    declared: Arc<[ArgKind]>,
    func: AsyncCall,
}

impl AsyncBuiltinListenerMatcher {
    pub fn new<F, T>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: AsyncPredicateFn<T>,
        T: 'static,
    {
        Self {
            name: name.into(),
            declared: F::declared_args().into(),
            func: Arc::new(move |args| func.call_with(args)),
        }
    }
}

#[async_trait]
impl ListenerMatcher for AsyncBuiltinListenerMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_args(&self) -> &[ArgKind] {
        &self.declared
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn matches(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
    ) -> BoltResult<bool> {
        let args = ResolvedArgs::resolve(&self.declared, request, response, &self.name);
        let pending = (self.func)(&args)?;
        let matched = pending.await;
        trace!(matcher = %self.name, matched, "Async matcher evaluated");
        Ok(matched)
    }
}

impl fmt::Debug for AsyncBuiltinListenerMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncBuiltinListenerMatcher")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .finish()
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Wraps a payload predicate into a matcher of the requested scheduling model.
///
/// The predicate declares only [`ArgKind::Body`]. With `is_async` set, it is
/// evaluated inside the returned future rather than at call time.
pub fn build_listener_matcher<F>(name: impl Into<Arc<str>>, func: F, is_async: bool) -> BoxedMatcher
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let func = Arc::new(func);
    if is_async {
        Arc::new(AsyncBuiltinListenerMatcher::new(
            name,
            move |body: Arc<Value>| {
                let func = Arc::clone(&func);
                async move { func(&body) }
            },
        ))
    } else {
        Arc::new(BuiltinListenerMatcher::new(name, move |body: Arc<Value>| {
            func(&body)
        }))
    }
}

/// Turns any synchronous predicate with extractor parameters into a matcher.
pub fn sync_matcher<F, T>(name: impl Into<Arc<str>>, func: F) -> BoxedMatcher
where
    F: PredicateFn<T>,
    T: 'static,
{
    Arc::new(BuiltinListenerMatcher::new(name, func))
}

/// Turns any asynchronous predicate with extractor parameters into a matcher.
pub fn async_matcher<F, T>(name: impl Into<Arc<str>>, func: F) -> BoxedMatcher
where
    F: AsyncPredicateFn<T>,
    T: 'static,
{
    Arc::new(AsyncBuiltinListenerMatcher::new(name, func))
}
