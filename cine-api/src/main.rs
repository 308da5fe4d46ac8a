use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cine_api::{app, worker::spawn_expiry_worker, AppState};
use cine_booking::{BookingOrchestrator, SessionRegistry};
use cine_catalog::concessions::ConcessionCatalog;
use cine_core::payment::MockPaymentAdapter;
use cine_store::{MemoryBookingStore, MemoryCatalogStore, MemoryInventoryStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cine_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cine_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Cine API on port {}", config.server.port);

    let catalog = Arc::new(MemoryCatalogStore::with_fixtures());
    let inventory = Arc::new(
        MemoryInventoryStore::from_showtimes(&catalog.showtimes())
            .expect("Failed to seed inventory"),
    );
    let bookings = Arc::new(MemoryBookingStore::new());
    let payments = Arc::new(MockPaymentAdapter);

    let orchestrator = Arc::new(BookingOrchestrator::new(
        catalog.clone(),
        inventory.clone(),
        bookings,
        payments,
        Duration::seconds(config.business_rules.session_window_seconds as i64),
        Duration::seconds(config.business_rules.payment_window_seconds as i64),
    ));

    let app_state = AppState {
        registry: Arc::new(SessionRegistry::new()),
        orchestrator,
        catalog,
        inventory,
        concessions: Arc::new(ConcessionCatalog::standard()),
        business_rules: config.business_rules.clone(),
    };

    spawn_expiry_worker(app_state.clone());

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
