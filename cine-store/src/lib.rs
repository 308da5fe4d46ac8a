pub mod app_config;
pub mod memory;

pub use app_config::{BusinessRules, Config, ServerConfig};
pub use memory::{MemoryBookingStore, MemoryCatalogStore, MemoryInventoryStore};
