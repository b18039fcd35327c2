//! Afisha server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use afisha_api::{AppState, auth_middleware, router as api_router};
use afisha_common::{Config, JwtService};
use afisha_core::{
    EventService, NoopNotifier, PollService, ReminderService, SharedNotifier, StatsService,
    UserService,
};
use afisha_db::repositories::{
    EventRepository, PollRepository, ReminderRepository, SavedEventRepository, UserRepository,
    VoteRepository,
};
use afisha_jobs::{SchedulerConfig, TelegramNotifier, run_scheduler};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "afisha=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting afisha server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = afisha_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    afisha_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let saved_repo = SavedEventRepository::new(Arc::clone(&db));
    let reminder_repo = ReminderRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    // Initialize services
    let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);
    let user_service = UserService::new(
        user_repo.clone(),
        jwt,
        config.telegram.admin_ids.clone(),
    );
    let event_service = EventService::new(
        event_repo.clone(),
        saved_repo.clone(),
        reminder_repo.clone(),
        chrono::Duration::minutes(config.jobs.reminder_lead_minutes),
    );
    let poll_service = PollService::new(poll_repo.clone(), vote_repo.clone());
    let stats_service = StatsService::new(
        user_repo.clone(),
        event_repo.clone(),
        poll_repo.clone(),
        vote_repo.clone(),
    );

    // Reminder sweeper with the Telegram notifier
    let notifier: SharedNotifier = if config.telegram.bot_token.is_empty() {
        tracing::warn!("No bot token configured; reminders will not be delivered");
        Arc::new(NoopNotifier)
    } else {
        Arc::new(TelegramNotifier::new(&config.telegram.bot_token))
    };
    let reminder_service = ReminderService::new(
        reminder_repo,
        event_repo,
        saved_repo,
        user_repo,
        notifier,
    );
    run_scheduler(
        SchedulerConfig {
            reminder_sweep_interval: Duration::from_secs(config.jobs.reminder_sweep_secs),
        },
        reminder_service,
    );
    info!(
        interval_secs = config.jobs.reminder_sweep_secs,
        "Reminder sweeper started"
    );

    // Build the router
    let state = AppState {
        user_service,
        event_service,
        poll_service,
        stats_service,
        bot_token: config.telegram.bot_token.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Serve
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, url = %config.server.url, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
