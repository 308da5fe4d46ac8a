use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use cine_booking::{Booking, BookingStatus, BookingStore, PaymentStatus};
use cine_catalog::seatmap::standard_seat_map;
use cine_catalog::{
    CatalogStore, Cinema, InventoryError, InventoryManager, InventoryStore, Movie, MovieStatus,
    ReservationToken, Selection, ShowFormat, Showtime, ShowtimeInventory,
};
use cine_core::StoreError;

fn lock_poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{} lock poisoned", what))
}

/// Inventory store backed by the in-memory manager.
///
/// All of reserve's check-and-update runs under one write lock, which is the
/// conditional-write guarantee the reservation contract requires: of two
/// overlapping reservations, exactly one can win.
#[derive(Default)]
pub struct MemoryInventoryStore {
    inner: RwLock<InventoryManager>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed seated inventory for every showtime in the catalog fixture.
    pub fn from_showtimes(showtimes: &[Showtime]) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut manager = store
                .inner
                .write()
                .map_err(|_| lock_poisoned("inventory"))?;
            let seat_map = standard_seat_map();
            for showtime in showtimes {
                manager.initialize_seated(&showtime.id, &seat_map, &showtime.occupied_seats);
            }
        }
        Ok(store)
    }

    pub fn seed_capacity(&self, showtime_id: &str, total: u32) -> Result<(), StoreError> {
        self.inner
            .write()
            .map_err(|_| lock_poisoned("inventory"))?
            .initialize_capacity(showtime_id, total);
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn reserve(
        &self,
        showtime_id: &str,
        selection: Selection,
    ) -> Result<ReservationToken, InventoryError> {
        let mut manager = self
            .inner
            .write()
            .map_err(|_| InventoryError::Store(lock_poisoned("inventory")))?;
        let token = manager.reserve(showtime_id, selection)?;
        debug!(showtime_id, token_id = %token.id, "Inventory reserved");
        Ok(token)
    }

    async fn release(&self, token: &ReservationToken) -> Result<bool, InventoryError> {
        let mut manager = self
            .inner
            .write()
            .map_err(|_| InventoryError::Store(lock_poisoned("inventory")))?;
        Ok(manager.release(token))
    }

    async fn seat_view(
        &self,
        showtime_id: &str,
    ) -> Result<Option<ShowtimeInventory>, InventoryError> {
        let manager = self
            .inner
            .read()
            .map_err(|_| InventoryError::Store(lock_poisoned("inventory")))?;
        Ok(manager.get(showtime_id).cloned())
    }
}

/// Booking persistence with unique-code enforcement.
#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<HashMap<String, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn save(&self, booking: Booking) -> Result<(), StoreError> {
        let mut bookings = self
            .bookings
            .write()
            .map_err(|_| lock_poisoned("bookings"))?;
        if bookings.contains_key(&booking.booking_code) {
            return Err(StoreError::DuplicateCode(booking.booking_code));
        }
        debug!(code = %booking.booking_code, "Booking persisted");
        bookings.insert(booking.booking_code.clone(), booking);
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, StoreError> {
        let bookings = self.bookings.read().map_err(|_| lock_poisoned("bookings"))?;
        Ok(bookings.get(code).cloned())
    }

    async fn set_status(&self, code: &str, status: BookingStatus) -> Result<(), StoreError> {
        let mut bookings = self
            .bookings
            .write()
            .map_err(|_| lock_poisoned("bookings"))?;
        let booking = bookings
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.to_string()))?;
        booking.status = status;
        Ok(())
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, StoreError> {
        let mut bookings = self
            .bookings
            .write()
            .map_err(|_| lock_poisoned("bookings"))?;
        let mut stale = Vec::new();
        for booking in bookings.values_mut() {
            if booking.status == BookingStatus::Active
                && booking.payment_status == PaymentStatus::Pending
                && booking.is_expired(now)
            {
                booking.status = BookingStatus::Expired;
                stale.push(booking.clone());
            }
        }
        Ok(stale)
    }
}

/// Read-only catalog seeded with the fixture schedule.
pub struct MemoryCatalogStore {
    movies: HashMap<i64, Movie>,
    cinemas: HashMap<String, Cinema>,
    showtimes: HashMap<String, Showtime>,
}

impl MemoryCatalogStore {
    pub fn new(movies: Vec<Movie>, cinemas: Vec<Cinema>, showtimes: Vec<Showtime>) -> Self {
        Self {
            movies: movies.into_iter().map(|m| (m.id, m)).collect(),
            cinemas: cinemas.into_iter().map(|c| (c.id.clone(), c)).collect(),
            showtimes: showtimes.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// The development/demo schedule.
    pub fn with_fixtures() -> Self {
        Self::new(fixture_movies(), fixture_cinemas(), fixture_showtimes())
    }

    pub fn showtimes(&self) -> Vec<Showtime> {
        self.showtimes.values().cloned().collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get_movie(&self, id: i64) -> Result<Option<Movie>, StoreError> {
        Ok(self.movies.get(&id).cloned())
    }

    async fn get_cinema(&self, id: &str) -> Result<Option<Cinema>, StoreError> {
        Ok(self.cinemas.get(id).cloned())
    }

    async fn get_showtime(&self, id: &str) -> Result<Option<Showtime>, StoreError> {
        Ok(self.showtimes.get(id).cloned())
    }
}

fn fixture_movies() -> Vec<Movie> {
    vec![
        Movie {
            id: 693134,
            title: "Dune: Part Two".to_string(),
            duration_minutes: 167,
            status: MovieStatus::NowShowing,
        },
        Movie {
            id: 1022789,
            title: "Inside Out 2".to_string(),
            duration_minutes: 96,
            status: MovieStatus::NowShowing,
        },
        Movie {
            id: 823464,
            title: "Godzilla x Kong: The New Empire".to_string(),
            duration_minutes: 115,
            status: MovieStatus::NowShowing,
        },
        Movie {
            id: 929590,
            title: "Civil War".to_string(),
            duration_minutes: 109,
            status: MovieStatus::ComingSoon,
        },
    ]
}

fn fixture_cinemas() -> Vec<Cinema> {
    vec![
        Cinema {
            id: "c1".to_string(),
            name: "CGV Vincom Center".to_string(),
            location: "District 1, HCMC".to_string(),
        },
        Cinema {
            id: "c2".to_string(),
            name: "CGV Crescent Mall".to_string(),
            location: "District 7, HCMC".to_string(),
        },
        Cinema {
            id: "c3".to_string(),
            name: "CGV Royal City".to_string(),
            location: "Thanh Xuan, Hanoi".to_string(),
        },
    ]
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn showtime(
    id: &str,
    movie_id: i64,
    cinema_id: &str,
    screen: u32,
    starts_at: DateTime<Utc>,
    format: ShowFormat,
    occupied: &[&str],
) -> Showtime {
    Showtime {
        id: id.to_string(),
        movie_id,
        cinema_id: cinema_id.to_string(),
        screen,
        starts_at,
        format,
        occupied_seats: occupied.iter().map(|s| s.to_string()).collect(),
    }
}

fn fixture_showtimes() -> Vec<Showtime> {
    vec![
        showtime("st1", 693134, "c1", 1, at(2024, 7, 28, 18, 0), ShowFormat::Imax, &["A1", "C5", "D8", "F3"]),
        showtime("st2", 693134, "c1", 1, at(2024, 7, 28, 21, 0), ShowFormat::Imax, &["B2", "B3", "G6", "G7"]),
        showtime("st3", 693134, "c2", 2, at(2024, 7, 28, 19, 30), ShowFormat::TwoD, &["E4", "E5"]),
        showtime("st4", 693134, "c3", 3, at(2024, 7, 29, 20, 0), ShowFormat::ThreeD, &["C1", "C2", "C3"]),
        showtime("st5", 1022789, "c1", 2, at(2024, 7, 28, 17, 0), ShowFormat::TwoD, &["A5", "A6", "H1", "H2"]),
        showtime("st6", 1022789, "c2", 1, at(2024, 7, 28, 17, 45), ShowFormat::ThreeD, &["F10", "F11"]),
        showtime("st7", 1022789, "c2", 3, at(2024, 7, 28, 20, 15), ShowFormat::TwoD, &["D1", "D2", "G8"]),
        showtime("st8", 1022789, "c3", 1, at(2024, 7, 29, 18, 30), ShowFormat::TwoD, &[]),
        showtime("st9", 823464, "c1", 3, at(2024, 7, 28, 22, 0), ShowFormat::ThreeD, &["B6", "C7", "D8", "E9", "F10"]),
        showtime("st10", 823464, "c3", 2, at(2024, 7, 29, 21, 30), ShowFormat::Imax, &["G1", "G2", "G3", "G4"]),
    ]
}
