//! Utility Agent Server Entry Point

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use utility_agent_config::{load_settings, Settings};
use utility_agent_persistence::{PersistenceLayer, ScyllaConfig};
use utility_agent_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var("UTILITY_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Utility Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    config.validate()?;

    if config.observability.metrics_enabled {
        init_metrics()?;
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let persistence = init_persistence(&config).await;
    let llm = match utility_agent_llm::build_language_model(&config.llm) {
        Ok(llm) => llm,
        Err(e) => {
            tracing::warn!(error = %e, "Language model unavailable, model path will greet only");
            None
        }
    };

    let state = AppState::new(config.clone(), persistence, llm);
    tracing::info!(
        llm = state.chat.has_model(),
        ocr = state.ocr.is_some(),
        speech = state.speech.is_some(),
        "Initialized application state"
    );

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// ScyllaDB when enabled, otherwise (or on connection failure) in-memory stores
async fn init_persistence(config: &Settings) -> PersistenceLayer {
    let persistence = &config.persistence;
    if !persistence.enabled {
        tracing::info!(
            seed_demo_data = persistence.seed_demo_data,
            "Persistence disabled, using in-memory stores"
        );
        return utility_agent_persistence::in_memory(persistence.seed_demo_data);
    }

    tracing::info!("Initializing ScyllaDB persistence layer...");
    let scylla_config = ScyllaConfig {
        hosts: persistence.scylla_hosts.clone(),
        keyspace: persistence.keyspace.clone(),
        replication_factor: persistence.replication_factor,
    };
    match utility_agent_persistence::init(scylla_config, persistence.seed_demo_data).await {
        Ok(layer) => {
            tracing::info!(
                hosts = ?persistence.scylla_hosts,
                keyspace = %persistence.keyspace,
                "ScyllaDB persistence initialized"
            );
            layer
        }
        Err(e) => {
            tracing::error!("Failed to initialize ScyllaDB: {}. Falling back to in-memory.", e);
            utility_agent_persistence::in_memory(persistence.seed_demo_data)
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("utility_agent={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
