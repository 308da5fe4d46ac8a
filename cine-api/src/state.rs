use std::sync::Arc;

use cine_booking::{BookingOrchestrator, SessionRegistry};
use cine_catalog::concessions::ConcessionCatalog;
use cine_catalog::{CatalogStore, InventoryStore};
use cine_store::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub catalog: Arc<dyn CatalogStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub concessions: Arc<ConcessionCatalog>,
    pub business_rules: BusinessRules,
}
