pub mod agent;
pub mod cli;
pub mod config;
pub mod http;
pub mod llm;
pub mod memory;
pub mod rotation;
pub mod trace;

use agent::GeminiSessionFactory;
use anyhow::Result;
use cli::{AppState, CliArgs, run_repl};
use config::AppConfig;
use http::client::{HttpClient, HttpDebugConfig};
use rotation::{CredentialPool, RotatingExecutor};
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;

    // Startup failure when no usable credential exists at all.
    let pool = CredentialPool::new(config.gemini_api_keys)?;

    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());

    let factory = GeminiSessionFactory::new(http, config.gemini_model, config.gemini_base_url);
    let executor = RotatingExecutor::new(factory, pool).with_trace(trace.clone());

    let mut app_state = AppState::new(executor, trace);
    run_repl(&mut app_state).await
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
