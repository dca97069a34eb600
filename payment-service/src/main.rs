use anyhow::Result;
use clap::Parser;
use diesel::{Connection, PgConnection};
use diesel_async::{
    pooled_connection::{bb8::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection,
};
use diesel_migrations::MigrationHarness;
use payment_service::{
    api::{self, AppState},
    config::{Args, StoreKind},
    metrics::Metrics,
    store::{InMemoryPaymentStore, PgPaymentStore},
    MIGRATIONS,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn run_migrations(database_url: &str) -> Result<()> {
    let mut conn = PgConnection::establish(database_url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("payment_service=info,tower_http=info")),
        )
        .init();
    let args = Args::parse();

    let metrics = Metrics::new()?;
    let state = match args.store {
        StoreKind::Postgres => {
            if args.skip_migrations {
                info!("Skipping database migrations");
            } else {
                info!("Running database migrations...");
                let database_url = args.database_url.clone();
                tokio::task::spawn_blocking(move || run_migrations(&database_url)).await??;
                info!("Migrations completed successfully");
            }

            let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&args.database_url);
            let pool = Pool::builder()
                .max_size(args.max_connections)
                .build(config)
                .await?;
            AppState::new(PgPaymentStore::new(pool), metrics)
        }
        StoreKind::Memory => {
            warn!("Using in-memory payment store; records are lost on restart");
            AppState::new(InMemoryPaymentStore::new(), metrics)
        }
    };

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    info!("Payment service started on port {}", args.port);
    info!("Payment API available at http://0.0.0.0:{}/api/payments", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
