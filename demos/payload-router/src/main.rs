//! Payload Router Example
//!
//! Loads `bolt.toml`, registers a mix of declared and programmatic
//! listeners, then routes each payload file through the app and prints
//! which listener handled it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package payload-router -- --config demos/payload-router/bolt.toml \
//!     demos/payload-router/payloads/*.json
//!
//! # List every matching listener instead of dispatching
//! cargo run --package payload-router -- --all demos/payload-router/payloads/*.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bolt::prelude::*;
use bolt::runtime::config::ConfigLoader;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "payload-router", about = "Route payload files through Bolt listeners")]
struct Cli {
    /// Configuration file (defaults to searching for bolt.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every matching listener instead of dispatching to the first
    #[arg(long)]
    all: bool,

    /// Payload JSON files
    #[arg(required = true)]
    payloads: Vec<PathBuf>,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// `/deploy <environment> [--force]`
#[derive(Parser, Debug, Clone)]
struct Deploy {
    environment: String,
    #[arg(long)]
    force: bool,
}

async fn deploy(args: CommandArgs<Deploy>, context: Arc<RequestContext>) -> String {
    let mode = if args.force { " (forced)" } else { "" };
    format!(
        "deploying to {}{mode} for {}",
        args.environment,
        context.user_id().unwrap_or("someone")
    )
}

async fn approve(body: Arc<Body>, logger: Logger) -> String {
    let action_id = body["actions"][0]["action_id"].as_str().unwrap_or_default();
    logger.info(&format!("approval {action_id}"));
    format!("approved {action_id}")
}

async fn bot_message(body: Arc<Body>) -> BoltResponse {
    let text = body["event"]["text"].as_str().unwrap_or_default();
    BoltResponse::text(format!("ignored bot message: {text}"))
}

async fn greet(context: Arc<RequestContext>) -> String {
    format!("hello, {}", context.user_id().unwrap_or("stranger"))
}

async fn save_settings(request: BoltRequest) -> Result<&'static str, String> {
    match request.body()["view"]["state"]["values"].as_object() {
        Some(_) => Ok("settings saved"),
        None => Err("settings view carried no state".to_string()),
    }
}

async fn team_options() -> BoltResponse {
    BoltResponse::json(&serde_json::json!({
        "options": [
            {"text": {"type": "plain_text", "text": "Engineering"}, "value": "eng"},
            {"text": {"type": "plain_text", "text": "Sales"}, "value": "sales"}
        ]
    }))
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn load_config(cli: &Cli) -> Result<BoltConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    Ok(loader.load()?)
}

fn build_app(config: &BoltConfig) -> Result<App> {
    let mut handlers = HandlerMap::new();
    handlers.insert("approve".into(), into_handler(approve));
    handlers.insert("bot-messages".into(), into_handler(bot_message));
    handlers.insert("team-picker".into(), into_handler(team_options));

    let app = App::from_config(config, &handlers)?;

    app.command("/deploy", deploy)?
        .message("hello", greet)?
        .view_submission("settings_modal", save_settings)?;

    // Only team T0001 may use the admin shortcut.
    let same_team = sync_matcher("team-T0001", |context: Arc<RequestContext>| {
        context.team_id() == Some("T0001")
    });
    app.add_listener(
        Listener::new(
            "admin-shortcut",
            build_matcher(ListenerCategory::GlobalShortcut, "admin_panel", false)?,
            into_handler(|| async { "opening admin panel" }),
        )
        .with_matcher(same_team),
    );

    info!(app = %app.name(), listeners = app.listener_count(), "Listeners registered");
    Ok(app)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let app = build_app(&config)?;

    for path in &cli.payloads {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;

        if cli.all {
            let request = BoltRequest::from_json_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            let names = app.matching_listeners(&request).await?;
            println!("{}: [{}]", path.display(), names.join(", "));
            continue;
        }

        match app.dispatch_json(&raw).await {
            Ok(response) => println!("{}: {} {}", path.display(), response.status, response.body),
            Err(e) => println!("{}: error: {e}", path.display()),
        }
    }

    Ok(())
}
