//! The Bolt application: listener registration and request dispatch.
//!
//! ```rust,ignore
//! use bolt_runtime::App;
//!
//! let app = App::builder()
//!     .config_file("bolt.toml")
//!     .handler("approve", approve)
//!     .build()?;
//!
//! app.command("/deploy", deploy)?
//!     .block_action(Constraint::pattern("^reject_")?, reject)?;
//!
//! let response = app.dispatch(&request).await?;
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use bolt_core::{BoltResult, Constraint};
use bolt_framework::{
    BoltRequest, BoltResponse, BoxedHandler, Dispatcher, Handler, Listener, ListenerCategory,
    build_matcher, into_handler,
};

use crate::config::{AppConfig, BoltConfig, ConfigLoader, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Handlers for declared listeners, keyed by listener name.
pub type HandlerMap = HashMap<String, BoxedHandler>;

/// A Bolt application.
///
/// Listeners can be registered through a shared reference, so an `App` can
/// live in an `Arc` and keep accepting registrations while it dispatches.
/// A dispatch works on a snapshot of the listeners taken when it starts.
pub struct App {
    config: AppConfig,
    dispatcher: RwLock<Arc<Dispatcher>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an app with default settings and no listeners.
    pub fn new() -> Self {
        Self::from_app_config(AppConfig::default())
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Creates an app from application settings without registering the
    /// declared listeners.
    pub fn from_app_config(config: AppConfig) -> Self {
        Self {
            config,
            dispatcher: RwLock::new(Arc::new(Dispatcher::new())),
        }
    }

    /// Validates `config`, initializes logging and registers every declared
    /// listener with its handler from `handlers`.
    pub fn from_config(config: &BoltConfig, handlers: &HandlerMap) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let app = Self::from_app_config(config.app.clone());
        let registered = app.register_declared(handlers)?;

        info!(
            app = %app.name(),
            declared = registered,
            log_level = %config.logging.level,
            "App initialized from configuration"
        );
        Ok(app)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn listener_count(&self) -> usize {
        self.dispatcher.read().listener_count()
    }

    /// Listener names in registration order.
    pub fn listener_names(&self) -> Vec<String> {
        self.dispatcher
            .read()
            .listeners()
            .iter()
            .map(|listener| listener.name().to_string())
            .collect()
    }

    /// Registers the listeners declared in the app configuration.
    ///
    /// Fails on the first listener without a handler or with a constraint
    /// its builder rejects; listeners before it stay registered.
    fn register_declared(&self, handlers: &HandlerMap) -> RuntimeResult<usize> {
        for declared in &self.config.listeners {
            let handler = handlers
                .get(&declared.name)
                .cloned()
                .ok_or_else(|| RuntimeError::HandlerNotFound(declared.name.clone()))?;
            let category = declared.parse_category()?;
            let constraint = declared.parse_constraint()?;
            let matcher = build_matcher(category, constraint, self.config.async_matchers)?;
            self.add_listener(Listener::new(declared.name.as_str(), matcher, handler));
        }
        Ok(self.config.listeners.len())
    }

    /// Registers a fully built listener, e.g. one with extra custom matchers.
    pub fn add_listener(&self, listener: Listener) -> &Self {
        debug!(app = %self.name(), listener = listener.name(), "Listener registered");
        let mut dispatcher = self.dispatcher.write();
        Arc::make_mut(&mut dispatcher).add(listener);
        self
    }

    /// Registers `handler` under the builtin matcher for `category`.
    ///
    /// The listener is named after its matcher, e.g. `command("/deploy")`.
    pub fn listen<H, T>(
        &self,
        category: ListenerCategory,
        constraint: impl Into<Constraint>,
        handler: H,
    ) -> BoltResult<&Self>
    where
        H: Handler<T>,
        T: 'static,
    {
        let matcher = build_matcher(category, constraint, self.config.async_matchers)?;
        let name = matcher.name().to_string();
        Ok(self.add_listener(Listener::new(name, matcher, into_handler(handler))))
    }

    /// Dispatches a request to the first matching listener.
    ///
    /// An unmatched request yields a `404` response, or
    /// [`RuntimeError::Unhandled`] when `raise_error_for_unhandled_request`
    /// is set.
    pub async fn dispatch(&self, request: &BoltRequest) -> RuntimeResult<BoltResponse> {
        let dispatcher = Arc::clone(&self.dispatcher.read());

        if let Some(response) = dispatcher.dispatch(request).await? {
            return Ok(response);
        }

        let kind = request.context().kind().map_or("unknown", |kind| kind.as_str());
        warn!(app = %self.name(), kind, "Unhandled request");
        if self.config.raise_error_for_unhandled_request {
            Err(RuntimeError::Unhandled)
        } else {
            Ok(BoltResponse::not_found())
        }
    }

    /// Names of every listener whose matchers all accept `request`, in
    /// registration order. No handler runs.
    pub async fn matching_listeners(&self, request: &BoltRequest) -> RuntimeResult<Vec<String>> {
        let dispatcher = Arc::clone(&self.dispatcher.read());
        let matched = dispatcher.matching_listeners(request).await?;
        Ok(matched
            .into_iter()
            .map(|listener| listener.name().to_string())
            .collect())
    }

    /// Parses a raw JSON body and dispatches it.
    pub async fn dispatch_json(&self, raw: &str) -> RuntimeResult<BoltResponse> {
        let request = BoltRequest::from_json_str(raw)
            .map_err(|e| RuntimeError::InvalidPayload(e.to_string()))?;
        self.dispatch(&request).await
    }
}

macro_rules! category_methods {
    ($($(#[$doc:meta])* $method:ident => $category:ident;)*) => {
        impl App {
            $(
                $(#[$doc])*
                pub fn $method<H, T>(
                    &self,
                    constraint: impl Into<Constraint>,
                    handler: H,
                ) -> BoltResult<&Self>
                where
                    H: Handler<T>,
                    T: 'static,
                {
                    self.listen(ListenerCategory::$category, constraint, handler)
                }
            )*
        }
    };
}

category_methods! {
    /// Slash commands, matched on `command`.
    command => Command;
    /// Events API events: an event type or a structured constraint.
    event => Event;
    /// `message` events whose text contains a keyword or matches a pattern.
    message => Message;
    workflow_step_execute => WorkflowStepExecute;
    /// Global or message shortcuts, matched on `callback_id`.
    shortcut => Shortcut;
    global_shortcut => GlobalShortcut;
    message_shortcut => MessageShortcut;
    /// Any interactive action, matched on its action or callback id.
    action => Action;
    block_action => BlockAction;
    attachment_action => AttachmentAction;
    dialog_submission => DialogSubmission;
    dialog_cancellation => DialogCancellation;
    workflow_step_edit => WorkflowStepEdit;
    /// View submissions by default, or any view type when structured.
    view => View;
    view_submission => ViewSubmission;
    view_closed => ViewClosed;
    workflow_step_save => WorkflowStepSave;
    /// External select options, block or dialog.
    options => Options;
    block_suggestion => BlockSuggestion;
    dialog_suggestion => DialogSuggestion;
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.config.name)
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// AppBuilder
// =============================================================================

/// Loads configuration and collects handlers for declared listeners.
#[derive(Default)]
pub struct AppBuilder {
    config_file: Option<PathBuf>,
    profile: Option<String>,
    overrides: Option<BoltConfig>,
    load_env: bool,
    handlers: HandlerMap,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            load_env: true,
            ..Default::default()
        }
    }

    /// Loads this file instead of searching the default locations.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Merges a configuration value over files and environment.
    pub fn merge(mut self, config: BoltConfig) -> Self {
        self.overrides = Some(config);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Attaches the handler for the declared listener called `name`.
    pub fn handler<H, T>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.handlers.insert(name.into(), into_handler(handler));
        self
    }

    pub fn build(self) -> RuntimeResult<App> {
        let mut loader = ConfigLoader::new();
        if let Some(profile) = &self.profile {
            loader = loader.profile(profile);
        }
        if let Some(config) = self.overrides {
            loader = loader.merge(config);
        }
        if let Some(path) = &self.config_file {
            loader = loader.file(path);
        }
        if !self.load_env {
            loader = loader.without_env();
        }

        let config = loader.load()?;
        App::from_config(&config, &self.handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, ListenerConfig};
    use bolt_core::{BoltError, ConstraintFields};
    use bolt_framework::sync_matcher;
    use serde_json::{Value, json};

    async fn ack() {}

    async fn echo_text(body: Arc<Value>) -> String {
        body["text"].as_str().unwrap_or_default().to_string()
    }

    fn request(body: Value) -> BoltRequest {
        BoltRequest::new(body)
    }

    fn declared(name: &str, category: &str, constraint: Value) -> ListenerConfig {
        ListenerConfig {
            name: name.into(),
            category: category.into(),
            constraint,
        }
    }

    #[tokio::test]
    async fn test_registration_and_dispatch() {
        let app = App::new();
        app.command("/echo", echo_text)
            .unwrap()
            .block_action("approve", || async { "approved" })
            .unwrap()
            .view_submission("settings", || async { "saved" })
            .unwrap();
        assert_eq!(app.listener_count(), 3);

        let echo = app
            .dispatch(&request(json!({"command": "/echo", "text": "hi"})))
            .await
            .unwrap();
        assert_eq!(echo.body, "hi");

        let approve = app
            .dispatch(&request(json!({
                "type": "block_actions",
                "actions": [{"action_id": "approve"}]
            })))
            .await
            .unwrap();
        assert_eq!(approve.body, "approved");

        let saved = app
            .dispatch(&request(json!({
                "type": "view_submission",
                "view": {"callback_id": "settings"}
            })))
            .await
            .unwrap();
        assert_eq!(saved.body, "saved");
    }

    #[tokio::test]
    async fn test_listener_names_follow_matchers() {
        let app = App::new();
        app.command("/deploy", ack).unwrap();
        app.event(
            ConstraintFields::new().with("type", "message").with_null("subtype"),
            ack,
        )
        .unwrap();

        let names = app.listener_names();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("command"));
        assert!(names[1].starts_with("event"));
    }

    #[tokio::test]
    async fn test_unhandled_request_is_not_found() {
        let app = App::new();
        app.command("/deploy", ack).unwrap();

        let response = app
            .dispatch(&request(json!({"command": "/other"})))
            .await
            .unwrap();
        assert_eq!(response, BoltResponse::not_found());
        assert_eq!(response.body, "unhandled request");
    }

    #[tokio::test]
    async fn test_unhandled_request_can_raise() {
        let app = App::from_app_config(AppConfig {
            raise_error_for_unhandled_request: true,
            ..Default::default()
        });
        let err = app
            .dispatch(&request(json!({"command": "/other"})))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Unhandled));
    }

    #[test]
    fn test_invalid_constraint_rejected_at_registration() {
        let app = App::new();
        let err = app
            .shortcut(ConstraintFields::new().with("type", "shortcut"), ack)
            .unwrap_err();
        assert!(matches!(err, BoltError::InvalidConstraintShape { .. }));
        assert_eq!(app.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_async_matchers_setting() {
        let app = App::from_app_config(AppConfig {
            async_matchers: true,
            ..Default::default()
        });
        app.options("team_picker", || async { "options" }).unwrap();

        let snapshot = Arc::clone(&app.dispatcher.read());
        assert!(snapshot.listeners()[0].matchers()[0].is_async());

        let response = app
            .dispatch(&request(json!({
                "type": "block_suggestion",
                "action_id": "team_picker"
            })))
            .await
            .unwrap();
        assert_eq!(response.body, "options");
    }

    #[tokio::test]
    async fn test_custom_listener() {
        let app = App::new();
        let matcher = bolt_framework::matcher_builders::command("/deploy", false).unwrap();
        let admin_only =
            sync_matcher("admin", |req: BoltRequest| req.context().user_id() == Some("U1"));
        app.add_listener(
            Listener::new("deploy", matcher, into_handler(|| async { "deploying" }))
                .with_matcher(admin_only),
        );

        let guest = app
            .dispatch(&request(json!({"command": "/deploy", "user_id": "U2"})))
            .await
            .unwrap();
        assert_eq!(guest.status, 404);

        let admin = app
            .dispatch(&request(json!({"command": "/deploy", "user_id": "U1"})))
            .await
            .unwrap();
        assert_eq!(admin.body, "deploying");
    }

    #[tokio::test]
    async fn test_declared_listeners() {
        let mut config = BoltConfig::default();
        config.app.listeners = vec![
            declared("deploy", "command", json!("/deploy")),
            declared("approve", "block_action", json!({"regex": "^approve_"})),
        ];
        let mut handlers = HandlerMap::new();
        handlers.insert("deploy".into(), into_handler(|| async { "deploy" }));
        handlers.insert("approve".into(), into_handler(|| async { "approve" }));

        let app = App::from_config(&config, &handlers).unwrap();
        assert_eq!(app.listener_names(), ["deploy", "approve"]);

        let response = app
            .dispatch(&request(json!({
                "type": "block_actions",
                "actions": [{"action_id": "approve_42"}]
            })))
            .await
            .unwrap();
        assert_eq!(response.body, "approve");
    }

    #[test]
    fn test_declared_listener_without_handler() {
        let mut config = BoltConfig::default();
        config.app.listeners = vec![declared("deploy", "command", json!("/deploy"))];

        let err = App::from_config(&config, &HandlerMap::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::HandlerNotFound(name) if name == "deploy"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = BoltConfig::default();
        config.app.listeners = vec![declared("x", "reaction_added", json!("x"))];

        let err = App::from_config(&config, &HandlerMap::new()).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::UnknownCategory { .. })
        ));
    }

    #[tokio::test]
    async fn test_matching_listeners_lists_every_match() {
        let app = App::new();
        app.action("approve", || async { "approve" })
            .unwrap()
            .block_action(Constraint::pattern("^appr").unwrap(), ack)
            .unwrap()
            .command("/deploy", ack)
            .unwrap();

        let names = app
            .matching_listeners(&request(json!({
                "type": "block_actions",
                "actions": [{"action_id": "approve"}]
            })))
            .await
            .unwrap();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("action"));
        assert!(names[1].starts_with("block_action"));
    }

    #[tokio::test]
    async fn test_dispatch_json() {
        let app = App::new();
        app.event("app_mention", || async { "mentioned" }).unwrap();

        let response = app
            .dispatch_json(r#"{"type": "event_callback", "event": {"type": "app_mention"}}"#)
            .await
            .unwrap();
        assert_eq!(response.body, "mentioned");

        let err = app.dispatch_json("not json").await.unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_shared_app_accepts_registration() {
        let app = Arc::new(App::new());
        let registrar = Arc::clone(&app);
        tokio::spawn(async move {
            registrar.command("/late", || async { "late" }).unwrap();
        })
        .await
        .unwrap();

        let response = app
            .dispatch(&request(json!({"command": "/late"})))
            .await
            .unwrap();
        assert_eq!(response.body, "late");
    }

    #[test]
    fn test_builder_with_defaults() {
        figment::Jail::expect_with(|_| {
            let app = App::builder()
                .merge(BoltConfig {
                    app: AppConfig {
                        name: "billing".into(),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .without_env()
                .build()
                .unwrap();
            assert_eq!(app.name(), "billing");
            assert_eq!(app.listener_count(), 0);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_builder_merge_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bolt.toml", "[app]\nname = \"from-file\"")?;
            let app = App::builder()
                .config_file("bolt.toml")
                .merge(BoltConfig {
                    app: AppConfig {
                        name: "from-merge".into(),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .without_env()
                .build()
                .unwrap();
            assert_eq!(app.name(), "from-merge");
            Ok(())
        });
    }
}
