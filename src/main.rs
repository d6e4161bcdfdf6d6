use std::sync::Arc;

use axum::{error_handling::HandleErrorLayer, http::StatusCode};
use tower::{BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use session_scheduler::{
    create_router,
    ports::{AvailabilitySource, CalendarNotifier, ChatNotifier},
    services::{
        availability_store::{load_availability_file, LayeredAvailabilityStore},
        booking::BookingEngine,
        database::create_database_stores,
        memory::InMemoryAvailabilitySource,
        notifications::{LoggingNotifier, Notifications},
        reschedule::RescheduleWorkflow,
        slot_resolver::SlotAvailabilityResolver,
    },
    AppState, Config, WebhookNotifierClient,
};

// Error handler
async fn handle_error(error: BoxError) -> (StatusCode, String) {
    if error.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "Request took too long".to_string(),
        )
    } else if error.is::<tower::load_shed::error::Overloaded>() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service is overloaded, try again later".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", error),
        )
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    config.log_summary();

    // Bookings and reschedule requests live in CSV files under DATA_DIR
    let (bookings, reschedules) =
        create_database_stores(&config.data_dir).expect("Failed to open data directory");
    info!("Database stores initialized");

    let current: Arc<dyn AvailabilitySource> = Arc::new(
        load_availability_file("trainerAvailability", &config.availability_path)
            .expect("Failed to load availability"),
    );
    let legacy: Arc<dyn AvailabilitySource> = match &config.legacy_availability_path {
        Some(path) => Arc::new(
            load_availability_file("trainers", path).expect("Failed to load legacy availability"),
        ),
        None => Arc::new(InMemoryAvailabilitySource::new("trainers")),
    };
    let availability = Arc::new(LayeredAvailabilityStore::new(current, legacy));

    let calendar: Arc<dyn CalendarNotifier>;
    let chat: Arc<dyn ChatNotifier>;
    match &config.webhook {
        Some(webhook) => {
            let client = Arc::new(
                WebhookNotifierClient::new(&webhook.url, &webhook.secret, config.request_timeout)
                    .expect("Failed to build webhook client"),
            );
            calendar = client.clone();
            chat = client;
        }
        None => {
            warn!("Notifications will only be written to the log");
            calendar = Arc::new(LoggingNotifier);
            chat = Arc::new(LoggingNotifier);
        }
    }

    let engine = Arc::new(BookingEngine::new(
        bookings.clone(),
        Notifications::new(calendar, chat),
    ));

    // Create shared application state
    let app_state = Arc::new(AppState {
        resolver: SlotAvailabilityResolver::new(availability, bookings),
        workflow: RescheduleWorkflow::new(Arc::clone(&engine), reschedules),
        engine,
    });

    let app = create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .load_shed()
            .concurrency_limit(config.concurrency_limit)
            .timeout(config.request_timeout)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any)),
    );

    info!("Server listening on {}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("Failed to bind to address");

    // Set up signal handler for graceful shutdown
    let shutdown = async {
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
                info!("Received interrupt signal, starting graceful shutdown");
            },
            _ = terminate => {
                info!("Received terminate signal, starting graceful shutdown");
            },
        }
    };

    info!("Server is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Failed to start server");

    info!("Server has been gracefully shut down");
}
