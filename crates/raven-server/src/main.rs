//! raven-server - REST API server binary.

use std::net::SocketAddr;

use raven_core::{OutreachScheduler, RavenConfig};
use raven_server::{
    create_conversation, create_outreach, create_server, create_server_with_auth, AppState,
};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// File given by `RAVEN_CONFIG` (if any), then environment overrides.
fn load_config() -> Result<RavenConfig, Box<dyn std::error::Error>> {
    let mut config = match std::env::var("RAVEN_CONFIG") {
        Ok(path) if !path.trim().is_empty() => {
            info!(path = %path, "Loading configuration file");
            RavenConfig::from_file(path)?
        }
        _ => RavenConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("raven_server=debug".parse()?),
        )
        .init();

    let config = load_config()?;

    let host = std::env::var("RAVEN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("RAVEN_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| format!("RAVEN_PORT must be a valid port number: {}", e))?;
    let api_key = std::env::var("RAVEN_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());

    let conversation = create_conversation(&config)?;
    let mut state = AppState::new(conversation.clone());

    let mut scheduler = None;
    if let Some(outreach) = create_outreach(&config, conversation)? {
        state = state.with_outreach(outreach.clone());
        if config.outreach.enabled {
            let mut job = OutreachScheduler::new(outreach, config.outreach.cron.clone()).await?;
            job.start().await?;
            info!(cron = %job.cron(), "Outreach scheduler started");
            scheduler = Some(job);
        }
    } else if config.outreach.enabled {
        warn!("Outreach is enabled but RAVEN_OUTREACH_WEBHOOK_URL is not set; scheduler not started");
    }

    // Create server with or without auth
    let app = match api_key {
        Some(key) => {
            info!("Authentication enabled");
            create_server_with_auth(state, key)
        }
        None => {
            info!("Authentication disabled");
            create_server(state)
        }
    };

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(model = %config.llm.config.model, "Starting raven-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping scheduler...");
        })
        .await?;

    if let Some(mut job) = scheduler {
        job.shutdown().await?;
    }

    info!("Server stopped cleanly");
    Ok(())
}
