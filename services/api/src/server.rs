use crate::cli::ServeArgs;
use crate::infra::{
    load_seed, AppState, InMemoryPlacementRepository, LoggingNotificationPublisher, SeedData,
};
use crate::routes::with_placement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_placement::config::AppConfig;
use campus_placement::error::AppError;
use campus_placement::telemetry;
use campus_placement::workflows::placement::PlacementService;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let seed = match args.seed.as_deref() {
        Some(path) => load_seed(path)?,
        None => SeedData::default(),
    };
    info!(
        jobs = seed.jobs.len(),
        students = seed.students.len(),
        "loaded placement seed data"
    );
    let repository = Arc::new(
        InMemoryPlacementRepository::seeded(seed)
            .map_err(io::Error::other)?,
    );
    let placement_service = Arc::new(PlacementService::new(
        repository,
        Arc::new(LoggingNotificationPublisher),
        config.eligibility.clone(),
    ));

    let app = with_placement_routes(placement_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        department_matching = ?config.eligibility.department_matching,
        unresolved_department = ?config.eligibility.unresolved_department,
        "campus placement service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
