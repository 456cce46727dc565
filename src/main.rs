use clap::Parser;
use dbaas_opensearch_adapter::{
    config::env_auth,
    create_router,
    registration::{HealthRecord, HttpAggregatorClient},
    server::AppState,
    AdapterConfig, OpenSearchSecurityClient, RecoveryEngine, RegistrationClient, RegistrationConfig,
    RetryPolicy,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dbaas-opensearch-adapter")]
#[command(about = "DBaaS adapter for OpenSearch user provisioning and recovery", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// OpenSearch base URL
    #[arg(long, default_value = "http://opensearch:9200")]
    opensearch_url: String,

    /// DBaaS aggregator base URL; registration is disabled when omitted
    #[arg(long)]
    aggregator_url: Option<String>,

    /// Physical database identifier announced to the aggregator
    #[arg(long, default_value = "opensearch")]
    physical_database_id: String,

    /// Address the aggregator uses to reach this adapter
    #[arg(long, default_value = "http://dbaas-opensearch-adapter:8080")]
    adapter_address: String,
}

impl Args {
    fn into_config(self) -> AdapterConfig {
        let adapter_auth = env_auth("DBAAS_ADAPTER");
        let registration = self.aggregator_url.map(|url| {
            RegistrationConfig::new(url, self.physical_database_id, self.adapter_address)
                .with_aggregator_auth(env_auth("DBAAS_AGGREGATOR"))
                .with_adapter_auth(adapter_auth.clone())
        });

        AdapterConfig {
            port: self.port,
            opensearch_url: self.opensearch_url,
            opensearch_auth: env_auth("OPENSEARCH"),
            adapter_auth,
            retry: RetryPolicy::from_env(),
            registration,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets may come from a local .env file
    let _ = dotenvy::dotenv();
    let config = Args::parse().into_config();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbaas_opensearch_adapter=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.retry.validate()?;
    if config.adapter_auth.username.is_empty() {
        tracing::warn!("DBAAS_ADAPTER_USERNAME is not set, recovery endpoints are unauthenticated");
    }

    let security_client = OpenSearchSecurityClient::new(
        config.opensearch_url.clone(),
        config.opensearch_auth.clone(),
        config.retry.request_timeout,
    )?;
    let recovery = RecoveryEngine::new(Arc::new(security_client), config.retry.clone());
    tracing::info!("Security API client targets {}", config.opensearch_url);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (health, registration_handle) = match &config.registration {
        Some(registration_config) => {
            let aggregator = HttpAggregatorClient::new(registration_config)?;
            let client = Arc::new(RegistrationClient::new(
                registration_config.clone(),
                Arc::new(aggregator),
            ));
            let health = client.health_record();
            let handle = tokio::spawn(client.run(shutdown_rx));
            (health, Some(handle))
        }
        None => {
            tracing::info!("No aggregator configured, registration disabled");
            (HealthRecord::default(), None)
        }
    };

    let state = AppState::new(recovery.clone(), health, config.adapter_auth.clone());
    let app = create_router(state);

    // Start server with graceful shutdown
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, stopping background tasks...");
    shutdown_tx.send_replace(true);
    recovery.shutdown().await;
    if let Some(handle) = registration_handle {
        if let Err(e) = handle.await {
            tracing::error!("Registration task failed: {}", e);
        }
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
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
