use tower_http::trace::TraceLayer;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use port_monitor_service::api::{create_router, AppState};
use port_monitor_service::config::Config;
use port_monitor_service::db::{
    seed, MeasurementRepository, ParameterRepository, StationRepository,
};
use port_monitor_service::services::{IngestionService, NameResolver, ReportService};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,port_monitor_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting port monitor service with config: {:?}", config);

    // Connect to the store and bring the schema up to date
    info!("Connecting to database...");
    let pool = port_monitor_service::db::pool::connect(&config.database_url).await?;

    // Create repositories
    let station_repo = StationRepository::new(pool.clone());
    let parameter_repo = ParameterRepository::new(pool.clone());
    let measurement_repo = MeasurementRepository::new(pool.clone());

    // Seed first-run stations and parameters
    seed::seed_initial_data(&station_repo, &parameter_repo).await?;

    // Create services
    let resolver = NameResolver::new(station_repo.clone(), parameter_repo.clone());
    let ingestion_service = IngestionService::new(measurement_repo.clone(), resolver);
    let report_service = ReportService::new(
        measurement_repo,
        station_repo,
        parameter_repo,
        config.demo_fallback,
    );

    // Create API router
    let app_state = AppState {
        ingestion_service,
        report_service,
        pool,
    };
    let app = create_router(app_state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
