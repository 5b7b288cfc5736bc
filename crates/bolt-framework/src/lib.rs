//! # Bolt Framework
//!
//! Listener matching and dispatch for Bolt applications.
//!
//! This layer provides:
//! - Matcher protocol with sync and async implementations
//! - Builtin matcher builders, one per listener category
//! - Explicit argument resolution for predicates and handlers
//! - A first-match-wins dispatcher
//! - Tower integration for gating services with matchers
//! - Clap-based slash-command arguments (with `command` feature)
//!
//! Payload classification and the constraint language live in `bolt-core`;
//! this crate turns them into callable matchers.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod matcher;
pub mod matcher_builders;
pub mod routing;

#[cfg(feature = "command")]
pub mod command;

pub use context::{BoltRequest, BoltResponse, Logger, RequestContext};
pub use dispatcher::{Dispatcher, Listener};
pub use error::{ExtractError, ExtractResult, ListenerSkipped};
pub use extractor::{ArgKind, ArgValue, FromArgs, ResolvedArgs};
pub use handler::{
    AsyncPredicateFn, BoxedHandler, Handler, IntoResponse, PredicateFn, into_handler,
};
pub use matcher::{
    AsyncBuiltinListenerMatcher, BoxedMatcher, BuiltinListenerMatcher, ListenerMatcher,
    async_matcher, build_listener_matcher, sync_matcher,
};
pub use matcher_builders::{ListenerCategory, ParseCategoryError, build_matcher};
pub use routing::{MatcherPredicate, ServiceBuilderExt, is_skipped, on};

#[cfg(feature = "command")]
pub use command::{CommandArgs, shell_split};
