use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bot_server::http;
use shared::config::{BotConfig, load_dotenv};
use shared::llm::{GeminiConfigError, GeminiGateway, GeminiGatewayConfig};
use shared::repos::{Store, StoreLimits};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "bot_server=info,shared=info,axum=info";

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }
    init_tracing();

    let config = match BotConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let gemini = match GeminiGatewayConfig::from_env()
        .map_err(GeminiConfigError::from)
        .and_then(GeminiGateway::new)
    {
        Ok(gateway) => gateway,
        Err(err) => {
            error!("failed to configure gemini gateway: {err}");
            std::process::exit(1);
        }
    };

    let http_client = match reqwest::Client::builder()
        .timeout(Duration::from_millis(config.http_timeout_ms))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            error!("failed to build http client: {err}");
            std::process::exit(1);
        }
    };

    let store = match Store::connect(
        &config.store_backend,
        http_client.clone(),
        StoreLimits {
            conversation_max_turns: config.conversation_max_turns,
            listening_history_max: config.listening_history_max,
        },
    )
    .await
    {
        Ok(store) => store,
        Err(err) => {
            error!("failed to connect to document store: {err}");
            std::process::exit(1);
        }
    };

    if config.seed_default_tracks
        && let Err(err) = store.seed_default_tracks().await
    {
        error!("failed to seed default tracks: {err}");
        std::process::exit(1);
    }

    let app = http::build_router(http::AppState::from_config(
        &config,
        store,
        http_client,
        Arc::new(gemini),
    ));

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid bind address {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        intent_strategy = ?config.intent_strategy,
        "bot server listening on {}",
        listener.local_addr().unwrap_or(addr)
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
