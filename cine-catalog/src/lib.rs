pub mod concessions;
pub mod inventory;
pub mod models;
pub mod pricing;
pub mod seatmap;

pub use concessions::{Concession, ConcessionCatalog, ConcessionError, ConcessionLedger};
pub use inventory::{
    InventoryError, InventoryManager, InventoryStore, ReservationToken, Selection,
    ShowtimeInventory,
};
pub use models::{CatalogStore, Cinema, Movie, MovieStatus, ShowFormat, Showtime};
pub use seatmap::{Seat, SeatCategory};
