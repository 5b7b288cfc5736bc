//! Listener dispatcher for the Bolt framework.
//!
//! The [`Dispatcher`] holds [`Listener`]s in registration order. Each
//! listener pairs one or more matchers with a handler. When a request is
//! dispatched:
//!
//! 1. Listeners are checked in registration order
//! 2. A listener matches when every one of its matchers matches
//! 3. The first matching listener runs and dispatch stops
//!
//! ```rust,ignore
//! use bolt_framework::{Dispatcher, Listener, into_handler, matcher_builders::command};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add(Listener::new(
//!     "deploy",
//!     command("/deploy", false)?,
//!     into_handler(deploy_handler),
//! ));
//! ```

use std::sync::Arc;

use tracing::{Instrument, Level, debug, error, span};

use bolt_core::{BoltError, BoltResult};

use crate::context::{BoltRequest, BoltResponse};
use crate::handler::BoxedHandler;
use crate::matcher::BoxedMatcher;

// ============================================================================
// Listener
// ============================================================================

/// A handler together with the matchers that select it.
#[derive(Clone)]
pub struct Listener {
    name: Arc<str>,
    matchers: Vec<BoxedMatcher>,
    handler: BoxedHandler,
}

impl Listener {
    /// Creates a listener guarded by `primary`.
    pub fn new(name: impl Into<Arc<str>>, primary: BoxedMatcher, handler: BoxedHandler) -> Self {
        Self {
            name: name.into(),
            matchers: vec![primary],
            handler,
        }
    }

    /// Adds a further matcher that must also pass (builder pattern).
    pub fn with_matcher(mut self, matcher: BoxedMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matchers(&self) -> &[BoxedMatcher] {
        &self.matchers
    }

    /// Returns `true` when every matcher accepts the request.
    ///
    /// Matchers are evaluated in order and evaluation stops at the first
    /// rejection.
    pub async fn matches(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
    ) -> BoltResult<bool> {
        for matcher in &self.matchers {
            if !matcher.matches(request, response).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs the handler.
    pub async fn run(
        &self,
        request: &BoltRequest,
        response: Option<&BoltResponse>,
    ) -> BoltResult<BoltResponse> {
        self.handler
            .call(request, response, &self.name)
            .await
            .map_err(BoltError::from)
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("matcher_count", &self.matchers.len())
            .finish()
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// The central listener dispatcher.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync` and can be safely shared across threads.
#[derive(Default, Clone)]
pub struct Dispatcher {
    listeners: Vec<Listener>,
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener. Listeners are checked in the order they are added.
    pub fn add(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Adds a listener (builder pattern).
    pub fn with(mut self, listener: Listener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Clears all registered listeners.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Dispatches a request to the first matching listener.
    ///
    /// Matchers and the handler see the same initial `200` acknowledgement as
    /// their response.
    ///
    /// # Returns
    ///
    /// `Ok(Some(response))` from the selected listener, `Ok(None)` when no
    /// listener matched, or `Err` when a matcher or handler declared an
    /// argument the request could not supply.
    pub async fn dispatch(&self, request: &BoltRequest) -> BoltResult<Option<BoltResponse>> {
        let kind = request
            .context()
            .kind()
            .map_or("unknown", |kind| kind.as_str());
        let span = span!(Level::DEBUG, "dispatch", kind = %kind);

        async {
            let initial = BoltResponse::ok();
            for listener in &self.listeners {
                if !listener.matches(request, Some(&initial)).await? {
                    continue;
                }
                debug!(listener = listener.name(), "Listener selected");
                return match listener.run(request, Some(&initial)).await {
                    Ok(response) => Ok(Some(response)),
                    Err(e) => {
                        error!(listener = listener.name(), "Listener failed: {e}");
                        Err(e)
                    }
                };
            }
            debug!("No listener matched");
            Ok::<_, BoltError>(None)
        }
        .instrument(span)
        .await
    }

    /// Returns every listener that matches the request, in registration order.
    pub async fn matching_listeners(&self, request: &BoltRequest) -> BoltResult<Vec<&Listener>> {
        let initial = BoltResponse::ok();
        let mut matched = Vec::new();
        for listener in &self.listeners {
            if listener.matches(request, Some(&initial)).await? {
                matched.push(listener);
            }
        }
        Ok(matched)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}
