use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use telegate::{
    services::{CookieJarStore, LoginFlow, LoginLocks, OAuthClient, SessionStore, TokenStore},
    AppState, Configuration,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    // Load configuration
    let configuration = Arc::new(Configuration::new()?);
    tracing::info!("Configuration loaded successfully");

    // Initialize services
    let oauth_client = Arc::new(OAuthClient::new(&configuration.provider)?);
    let session_store = Arc::new(SessionStore::new(configuration.storage.sessions_dir())?);
    let token_store = Arc::new(TokenStore::new(
        configuration.storage.tokens_dir(),
        oauth_client.clone(),
    )?);
    let cookie_store = Arc::new(CookieJarStore::new(configuration.storage.cookies_dir())?);
    let login_flow = Arc::new(LoginFlow::new(
        configuration.clone(),
        oauth_client,
        session_store.clone(),
        token_store.clone(),
        cookie_store.clone(),
    ));

    let app_state = AppState {
        configuration: configuration.clone(),
        session_store,
        token_store,
        cookie_store,
        login_flow,
        login_locks: Arc::new(LoginLocks::new()),
    };

    let app = telegate::app(app_state);

    // Start server
    let addr = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
