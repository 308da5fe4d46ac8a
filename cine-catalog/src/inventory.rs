use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::seatmap::Seat;
use cine_core::StoreError;

/// What a session is asking to reserve: named seats, or a ticket count for
/// capacity-only showtimes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Selection {
    Seats { seats: Vec<String> },
    Tickets { quantity: u32 },
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Seats { seats } => seats.is_empty(),
            Selection::Tickets { quantity } => *quantity == 0,
        }
    }

    /// Number of seats or tickets requested.
    pub fn count(&self) -> u32 {
        match self {
            Selection::Seats { seats } => seats.len() as u32,
            Selection::Tickets { quantity } => *quantity,
        }
    }
}

/// Per-showtime inventory. Seated showtimes track the exact seat partition;
/// capacity showtimes only a remaining count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum ShowtimeInventory {
    Seated {
        available: BTreeSet<String>,
        booked: BTreeSet<String>,
    },
    Capacity {
        remaining: u32,
        total: u32,
    },
}

/// Receipt for a successful reservation. Releasing consumes the token, which
/// is what makes release idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationToken {
    pub id: Uuid,
    pub showtime_id: String,
    pub selection: Selection,
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Showtime inventory not found: {0}")]
    UnknownShowtime(String),

    #[error("Seats unavailable: {seats:?}")]
    SeatUnavailable { seats: Vec<String> },

    #[error("Insufficient capacity: requested {requested}, remaining {remaining}")]
    InsufficientCapacity { requested: u32, remaining: u32 },

    #[error("Selection does not match the seating layout of showtime {0}")]
    SelectionMismatch(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tracks inventory for all showtimes plus the table of live reservations.
///
/// `reserve` is a single check-and-update on `&mut self`; callers that share
/// a manager across sessions must serialize access through one lock so that
/// two overlapping reservations cannot both win.
pub struct InventoryManager {
    inventory: HashMap<String, ShowtimeInventory>,
    reservations: HashMap<Uuid, (String, Selection)>,
}

impl InventoryManager {
    pub fn new() -> Self {
        Self {
            inventory: HashMap::new(),
            reservations: HashMap::new(),
        }
    }

    /// Seed a seated showtime from a seat map, marking `occupied` ids as
    /// already booked.
    pub fn initialize_seated(&mut self, showtime_id: &str, seats: &[Seat], occupied: &[String]) {
        let mut available = BTreeSet::new();
        let mut booked = BTreeSet::new();
        for seat in seats {
            if occupied.iter().any(|o| o == &seat.id) {
                booked.insert(seat.id.clone());
            } else {
                available.insert(seat.id.clone());
            }
        }
        self.inventory.insert(
            showtime_id.to_string(),
            ShowtimeInventory::Seated { available, booked },
        );
    }

    /// Seed a capacity-only showtime.
    pub fn initialize_capacity(&mut self, showtime_id: &str, total: u32) {
        self.inventory.insert(
            showtime_id.to_string(),
            ShowtimeInventory::Capacity {
                remaining: total,
                total,
            },
        );
    }

    pub fn get(&self, showtime_id: &str) -> Option<&ShowtimeInventory> {
        self.inventory.get(showtime_id)
    }

    /// Seats or tickets still available for a showtime.
    pub fn available_count(&self, showtime_id: &str) -> Option<u32> {
        self.inventory.get(showtime_id).map(|inv| match inv {
            ShowtimeInventory::Seated { available, .. } => available.len() as u32,
            ShowtimeInventory::Capacity { remaining, .. } => *remaining,
        })
    }

    /// Atomically reserve a selection. All-or-nothing: on failure the
    /// inventory is untouched.
    pub fn reserve(
        &mut self,
        showtime_id: &str,
        selection: Selection,
    ) -> Result<ReservationToken, InventoryError> {
        if selection.is_empty() {
            return Err(InventoryError::InvalidSelection(
                "selection must contain at least one seat or ticket".to_string(),
            ));
        }

        let inventory = self
            .inventory
            .get_mut(showtime_id)
            .ok_or_else(|| InventoryError::UnknownShowtime(showtime_id.to_string()))?;

        match (&selection, inventory) {
            (Selection::Seats { seats }, ShowtimeInventory::Seated { available, booked }) => {
                let unique: BTreeSet<&String> = seats.iter().collect();
                if unique.len() != seats.len() {
                    return Err(InventoryError::InvalidSelection(
                        "duplicate seat ids in selection".to_string(),
                    ));
                }

                let missing: Vec<String> = seats
                    .iter()
                    .filter(|s| !available.contains(*s))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(InventoryError::SeatUnavailable { seats: missing });
                }

                for seat in seats {
                    available.remove(seat);
                    booked.insert(seat.clone());
                }
            }
            (Selection::Tickets { quantity }, ShowtimeInventory::Capacity { remaining, .. }) => {
                if *quantity > *remaining {
                    return Err(InventoryError::InsufficientCapacity {
                        requested: *quantity,
                        remaining: *remaining,
                    });
                }
                *remaining -= quantity;
            }
            _ => {
                return Err(InventoryError::SelectionMismatch(showtime_id.to_string()));
            }
        }

        let token = ReservationToken {
            id: Uuid::new_v4(),
            showtime_id: showtime_id.to_string(),
            selection: selection.clone(),
        };
        self.reservations
            .insert(token.id, (showtime_id.to_string(), selection));
        Ok(token)
    }

    /// Release a reservation. Returns false (and credits nothing) when the
    /// token was already consumed, so inventory is never double-credited.
    pub fn release(&mut self, token: &ReservationToken) -> bool {
        let Some((showtime_id, selection)) = self.reservations.remove(&token.id) else {
            return false;
        };

        let Some(inventory) = self.inventory.get_mut(&showtime_id) else {
            // Showtime archived while the reservation was live; nothing to credit.
            return false;
        };

        match (&selection, inventory) {
            (Selection::Seats { seats }, ShowtimeInventory::Seated { available, booked }) => {
                for seat in seats {
                    if booked.remove(seat) {
                        available.insert(seat.clone());
                    }
                }
            }
            (Selection::Tickets { quantity }, ShowtimeInventory::Capacity { remaining, total }) => {
                *remaining = (*remaining + quantity).min(*total);
            }
            _ => {}
        }
        true
    }
}

impl Default for InventoryManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared inventory access for orchestration and the API layer. The backing
/// implementation must make `reserve` a single critical section.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn reserve(
        &self,
        showtime_id: &str,
        selection: Selection,
    ) -> Result<ReservationToken, InventoryError>;

    /// Idempotent. Ok(false) means the token had already been released.
    async fn release(&self, token: &ReservationToken) -> Result<bool, InventoryError>;

    async fn seat_view(&self, showtime_id: &str)
        -> Result<Option<ShowtimeInventory>, InventoryError>;
}
