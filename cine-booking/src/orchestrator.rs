use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    generate_booking_code, Booking, BookingStatus, BookingStore, PaymentStatus,
};
use crate::session::{BookingSession, ConfirmIntent, SessionError, ShowContext};
use cine_catalog::{CatalogStore, InventoryError, InventoryStore, ReservationToken};
use cine_core::payment::PaymentError;
use cine_core::{PaymentAdapter, PaymentOutcome, StoreError, UserId};

const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Selected seats were taken by another booking")]
    SeatConflict,

    #[error("Payment was declined")]
    PaymentFailed,

    #[error("Could not allocate a unique booking code")]
    CodeAllocation,

    #[error("Unknown movie: {0}")]
    UnknownMovie(i64),

    #[error("Unknown cinema: {0}")]
    UnknownCinema(String),

    #[error("Unknown showtime: {0}")]
    UnknownShowtime(String),

    #[error("Booking not found: {0}")]
    UnknownBooking(String),

    #[error("Booking {0} has already been used")]
    BookingUsed(String),

    #[error("Booking does not belong to the caller")]
    NotOwner,

    #[error(transparent)]
    Inventory(InventoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Coordinates session intents with the inventory, payment, and persistence
/// boundaries. The only component whose side effects cross into inventory.
pub struct BookingOrchestrator {
    catalog: Arc<dyn CatalogStore>,
    inventory: Arc<dyn InventoryStore>,
    bookings: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentAdapter>,
    session_window: Duration,
    payment_window: Duration,
}

impl BookingOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        inventory: Arc<dyn InventoryStore>,
        bookings: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentAdapter>,
        session_window: Duration,
        payment_window: Duration,
    ) -> Self {
        Self {
            catalog,
            inventory,
            bookings,
            payments,
            session_window,
            payment_window,
        }
    }

    /// Validate the show against the catalog and open a fresh session.
    pub async fn start_session(
        &self,
        user_id: UserId,
        movie_id: i64,
        cinema_id: &str,
        showtime_id: &str,
    ) -> Result<BookingSession, BookingError> {
        self.catalog
            .get_movie(movie_id)
            .await?
            .ok_or(BookingError::UnknownMovie(movie_id))?;
        self.catalog
            .get_cinema(cinema_id)
            .await?
            .ok_or_else(|| BookingError::UnknownCinema(cinema_id.to_string()))?;
        let showtime = self
            .catalog
            .get_showtime(showtime_id)
            .await?
            .ok_or_else(|| BookingError::UnknownShowtime(showtime_id.to_string()))?;
        // The showtime must actually be scheduled for this movie and cinema
        if showtime.movie_id != movie_id || showtime.cinema_id != cinema_id {
            return Err(BookingError::UnknownShowtime(showtime_id.to_string()));
        }

        let session = BookingSession::begin(
            user_id,
            ShowContext {
                movie_id,
                cinema_id: cinema_id.to_string(),
                showtime_id: showtime.id.clone(),
            },
            self.session_window,
        );
        info!(session_id = %session.id(), showtime_id, "Booking session started");
        Ok(session)
    }

    /// Commit a session: reserve inventory, take payment, persist the
    /// booking, then flip the session to Confirmed.
    ///
    /// Inventory is the first real commit point. A lost seat race surfaces
    /// as SeatConflict and leaves the session in AwaitingPayment so the user
    /// can re-select.
    pub async fn confirm(&self, session: &mut BookingSession) -> Result<Booking, BookingError> {
        let intent = session.confirm_intent()?;

        let token = match self
            .inventory
            .reserve(&intent.showtime_id, intent.selection.clone())
            .await
        {
            Ok(token) => token,
            Err(
                InventoryError::SeatUnavailable { .. }
                | InventoryError::InsufficientCapacity { .. },
            ) => {
                warn!(
                    session_id = %session.id(),
                    showtime_id = %intent.showtime_id,
                    "Reservation lost to a concurrent booking"
                );
                return Err(BookingError::SeatConflict);
            }
            Err(other) => return Err(BookingError::Inventory(other)),
        };

        let outcome = match self
            .payments
            .process(intent.total_amount, intent.payment_method)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.release_quietly(&token).await;
                return Err(err.into());
            }
        };

        let payment_status = match outcome {
            PaymentOutcome::Completed => PaymentStatus::Completed,
            PaymentOutcome::Pending => PaymentStatus::Pending,
            PaymentOutcome::Failed => {
                self.release_quietly(&token).await;
                return Err(BookingError::PaymentFailed);
            }
        };

        let booking = self
            .persist_booking(session, &intent, payment_status, token)
            .await?;

        session.mark_confirmed()?;
        info!(
            booking_code = %booking.booking_code,
            total_amount = booking.total_amount,
            "Booking confirmed"
        );
        Ok(booking)
    }

    async fn persist_booking(
        &self,
        session: &BookingSession,
        intent: &ConfirmIntent,
        payment_status: PaymentStatus,
        token: ReservationToken,
    ) -> Result<Booking, BookingError> {
        let now = Utc::now();
        let expires_at = match payment_status {
            PaymentStatus::Pending => Some(now + self.payment_window),
            _ => None,
        };

        let mut attempts = 0;
        loop {
            let booking = Booking {
                id: Uuid::new_v4(),
                booking_code: generate_booking_code(now),
                user_id: session.user_id().clone(),
                movie_id: intent.movie_id,
                cinema_id: intent.cinema_id.clone(),
                showtime_id: intent.showtime_id.clone(),
                selection: intent.selection.clone(),
                concessions: intent.concessions.clone(),
                total_amount: intent.total_amount,
                payment_method: intent.payment_method,
                payment_status,
                status: BookingStatus::Active,
                reservation: token.clone(),
                created_at: now,
                expires_at,
            };

            match self.bookings.save(booking.clone()).await {
                Ok(()) => return Ok(booking),
                Err(StoreError::DuplicateCode(code)) => {
                    attempts += 1;
                    if attempts >= MAX_CODE_ATTEMPTS {
                        self.release_quietly(&token).await;
                        return Err(BookingError::CodeAllocation);
                    }
                    warn!(%code, attempts, "Booking code collision, regenerating");
                }
                Err(err) => {
                    self.release_quietly(&token).await;
                    return Err(err.into());
                }
            }
        }
    }

    /// Owner-checked booking lookup.
    pub async fn get_booking(
        &self,
        code: &str,
        user_id: &UserId,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_by_code(code)
            .await?
            .ok_or_else(|| BookingError::UnknownBooking(code.to_string()))?;
        if booking.user_id != *user_id {
            return Err(BookingError::NotOwner);
        }
        Ok(booking)
    }

    /// Cancel a confirmed booking, releasing its inventory. Idempotent when
    /// the booking is already cancelled or expired.
    pub async fn cancel_booking(
        &self,
        code: &str,
        user_id: &UserId,
    ) -> Result<Booking, BookingError> {
        let mut booking = self.get_booking(code, user_id).await?;

        match booking.status {
            BookingStatus::Cancelled | BookingStatus::Expired => Ok(booking),
            BookingStatus::Used => Err(BookingError::BookingUsed(code.to_string())),
            BookingStatus::Active => {
                self.inventory
                    .release(&booking.reservation)
                    .await
                    .map_err(BookingError::Inventory)?;
                self.bookings
                    .set_status(code, BookingStatus::Cancelled)
                    .await?;
                booking.status = BookingStatus::Cancelled;
                info!(booking_code = %code, "Booking cancelled, inventory released");
                Ok(booking)
            }
        }
    }

    /// Expire stale pending-payment bookings and return their seats to the
    /// pool. Invoked by the background reaper.
    pub async fn reap_expired_bookings(&self) -> Result<usize, BookingError> {
        let stale = self.bookings.expire_stale(Utc::now()).await?;
        let count = stale.len();
        for booking in stale {
            self.release_quietly(&booking.reservation).await;
            info!(
                booking_code = %booking.booking_code,
                "Pending booking expired, inventory released"
            );
        }
        Ok(count)
    }

    async fn release_quietly(&self, token: &ReservationToken) {
        if let Err(err) = self.inventory.release(token).await {
            warn!(token_id = %token.id, "Failed to release reservation: {err}");
        }
    }
}
