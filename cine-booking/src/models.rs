use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cine_catalog::{ReservationToken, Selection};
use cine_core::{PaymentMethod, StoreError, UserId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Cancelled,
    Used,
    Expired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Concession line captured into a booking at confirmation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookedConcession {
    pub item: String,
    pub quantity: u32,
    pub unit_price: i32,
}

/// A confirmed, durable booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub user_id: UserId,
    pub movie_id: i64,
    pub cinema_id: String,
    pub showtime_id: String,
    pub selection: Selection,
    pub concessions: Vec<BookedConcession>,
    pub total_amount: i32,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    /// Inventory receipt; released when the booking is cancelled or expires.
    pub reservation: ReservationToken,
    pub created_at: DateTime<Utc>,
    /// Deadline for bookings persisted with a pending payment.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Human-shareable booking code: "BK" + timestamp (base36) + 4 random chars.
pub fn generate_booking_code(now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis().unsigned_abs();
    let mut stamp = Vec::new();
    loop {
        stamp.push(CODE_ALPHABET[(millis % 36) as usize]);
        millis /= 36;
        if millis == 0 {
            break;
        }
    }
    stamp.reverse();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();

    format!("BK{}{}", String::from_utf8_lossy(&stamp), suffix)
}

/// Durable booking persistence. `save` must reject duplicate booking codes
/// with `StoreError::DuplicateCode`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn save(&self, booking: Booking) -> Result<(), StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, StoreError>;

    async fn set_status(&self, code: &str, status: BookingStatus) -> Result<(), StoreError>;

    /// Transition stale pending-payment bookings to Expired and return them
    /// so the caller can release their inventory.
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_code_shape() {
        let now = Utc::now();
        let code = generate_booking_code(now);

        assert!(code.starts_with("BK"));
        assert!(code.len() > 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_booking_codes_vary() {
        let now = Utc::now();
        let codes: std::collections::HashSet<String> =
            (0..32).map(|_| generate_booking_code(now)).collect();
        // Random suffix makes same-millisecond collisions unlikely
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_booking_expiry_check() {
        let now = Utc::now();
        let token = ReservationToken {
            id: Uuid::new_v4(),
            showtime_id: "st1".to_string(),
            selection: Selection::Tickets { quantity: 1 },
        };
        let mut booking = Booking {
            id: Uuid::new_v4(),
            booking_code: "BKTEST".to_string(),
            user_id: UserId::new("u1"),
            movie_id: 1,
            cinema_id: "cgv-landmark".to_string(),
            showtime_id: "st1".to_string(),
            selection: Selection::Tickets { quantity: 1 },
            concessions: vec![],
            total_amount: 75_000,
            payment_method: PaymentMethod::Visa,
            payment_status: PaymentStatus::Pending,
            status: BookingStatus::Active,
            reservation: token,
            created_at: now,
            expires_at: Some(now - chrono::Duration::minutes(1)),
        };
        assert!(booking.is_expired(now));

        booking.expires_at = None;
        assert!(!booking.is_expired(now));
    }
}
