mod directory;
mod eligibility;
mod guardian;
mod identity;
mod orders;
mod participation;
mod player;
mod shared;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use directory::{cache::PageCache, DirectoryService, ScanBudget};
use eligibility::AgeBrackets;
use guardian::InMemoryGuardianProvider;
use orders::provider::InMemoryOrderProvider;
use participation::{ParticipationPolicy, ParticipationService};
use player::repository::InMemoryPlayerRepository;
use player::service::PlayerService;
use shared::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playerbook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting player roster service");

    // Create shared application state with dependency injection.
    // The in-memory backends are stand-ins for the host platform's
    // per-account metadata storage, account system and order subsystem.
    let player_repository = Arc::new(InMemoryPlayerRepository::new());
    let guardian_provider = Arc::new(InMemoryGuardianProvider::new());
    let order_provider = Arc::new(InMemoryOrderProvider::new());
    let page_cache = Arc::new(PageCache::with_default_ttl());
    let brackets = AgeBrackets::default();

    let player_service = Arc::new(PlayerService::new(
        player_repository.clone(),
        Arc::clone(&page_cache),
        brackets.clone(),
    ));
    let participation_service = Arc::new(ParticipationService::new(
        player_repository.clone(),
        order_provider.clone(),
        ParticipationPolicy::default(),
    ));
    let directory_service = Arc::new(DirectoryService::new(
        player_repository,
        guardian_provider,
        Arc::clone(&participation_service),
        Arc::clone(&page_cache),
        ScanBudget::default(),
        brackets,
    ));

    let app_state = AppState::new(player_service, participation_service, directory_service);

    // Periodically evict expired directory pages
    tokio::spawn(directory::cache::start_cache_sweep_task(
        page_cache,
        Duration::from_secs(5 * 60),
    ));

    let app = Router::new()
        .route(
            "/guardians/:guardian_id/players",
            post(player::handlers::submit_player)
                .get(player::handlers::list_players)
                .delete(player::handlers::delete_roster),
        )
        .route(
            "/guardians/:guardian_id/players/:index",
            get(player::handlers::get_player)
                .patch(player::handlers::edit_player)
                .delete(player::handlers::delete_player),
        )
        .route(
            "/guardians/:guardian_id/players/:index/events",
            get(participation::handlers::player_events),
        )
        .route("/directory", get(directory::handlers::directory_page))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
