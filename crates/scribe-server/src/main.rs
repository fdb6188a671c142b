//! Server binary: wires settings, provider, workflow core, and webhook shell.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scribe_llm::deepseek::{DeepSeekConfig, DeepSeekProvider};
use scribe_llm::generate::Generator;
use scribe_runtime::dispatcher::Dispatcher;
use scribe_runtime::machine::WorkflowMachine;
use scribe_runtime::store::SessionStore;
use scribe_server::lark::{LarkClient, LarkConfig};
use scribe_server::metrics;
use scribe_server::routes::{AppState, router};
use scribe_settings::loader::load_settings;

#[derive(Debug, Parser)]
#[command(name = "scribe-server", about = "Interactive content-creation bot server")]
struct Args {
    /// Path to a JSON settings file. Missing file falls back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address override, e.g. `0.0.0.0:3000`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let prometheus = metrics::install_recorder();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    if let Some(bind) = args.bind {
        settings.server.bind = bind;
    }

    let api_key = std::env::var(&settings.provider.api_key_env).with_context(|| {
        format!(
            "provider API key not set (env var {})",
            settings.provider.api_key_env
        )
    })?;
    let provider = DeepSeekProvider::new(DeepSeekConfig {
        model: settings.provider.model.clone(),
        api_key,
        base_url: settings.provider.base_url.clone(),
    });
    let generator = Generator::new(Arc::new(provider));

    let lark = Arc::new(LarkClient::new(
        LarkConfig::from_env().context("failed to load Lark credentials")?,
    ));

    let store = Arc::new(SessionStore::new());
    let machine = Arc::new(WorkflowMachine::new(
        Arc::clone(&store),
        generator,
        lark.clone(),
        lark.clone(),
        settings.workflow.preview_max_chars,
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        machine,
        lark.clone(),
        Duration::from_secs(settings.workflow.transition_deadline_secs),
    ));

    let state = AppState {
        dispatcher,
        transport: lark,
        verification_token: settings.server.verification_token.clone(),
        prometheus,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind))?;
    info!(bind = %settings.server.bind, model = %settings.provider.model, "scribe server listening");
    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
