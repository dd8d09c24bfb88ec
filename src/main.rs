use axum::{routing::get, Router};
use callcoach_intake::config::Config;
use callcoach_intake::db::Database;
use callcoach_intake::db_storage::PgStore;
use callcoach_intake::enrichment::LeadEnrichmentPipeline;
use callcoach_intake::gateways::PersistenceGateway;
use callcoach_intake::handlers::{self, ApiDoc, AppState};
use callcoach_intake::intake::IntakeService;
use callcoach_intake::supabase_client::SupabaseClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Supabase client and, when configured, the direct Postgres pool.
/// - The background enrichment pipeline.
/// - HTTP routes and middleware (CORS, Rate Limiting, Body Limit).
///
/// It then starts the Axum server and, on shutdown, waits for in-flight
/// enrichment tasks so accepted leads are not dropped.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callcoach_intake=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Supabase serves both research (Edge Function) and, by default, inserts (REST)
    let supabase = Arc::new(SupabaseClient::from_config(&config)?);
    tracing::info!("✓ Supabase client initialized: {}", config.supabase_url);

    let store: Arc<dyn PersistenceGateway> = match config.database_url.as_deref() {
        Some(database_url) => {
            let db = Database::new(database_url).await?;
            tracing::info!("Database connection pool established");
            Arc::new(PgStore::new(db.pool))
        }
        None => {
            tracing::info!("Persisting through the Supabase REST API");
            supabase.clone() as Arc<dyn PersistenceGateway>
        }
    };

    // Every lead is researched afresh; answers are never shared between submissions
    let pipeline = LeadEnrichmentPipeline::new(supabase.clone(), store.clone());
    let jobs = pipeline.jobs();

    // Build application state
    let app_state = Arc::new(AppState::new(IntakeService::new(pipeline, store)));

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Build protected routes with security layers
    let protected_routes = handlers::intake_routes().layer(
        ServiceBuilder::new()
            // Request size limit: form payloads are tiny
            .layer(RequestBodyLimitLayer::new(64 * 1024))
            // Rate limiting: 10 req/sec per IP, burst of 20
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Detached enrichment tasks keep running after the listener closes
    let pending = jobs.active();
    if pending > 0 {
        tracing::info!("Waiting for {} enrichment task(s) to finish", pending);
    }
    let remaining = jobs
        .drain(Duration::from_secs(config.shutdown_drain_secs))
        .await;
    if remaining > 0 {
        tracing::error!("Exiting with {} enrichment task(s) unfinished", remaining);
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}
