use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::BookedConcession;
use cine_catalog::concessions::{ConcessionCatalog, ConcessionError, ConcessionLedger};
use cine_catalog::{pricing, seatmap, Selection};
use cine_core::{PaymentMethod, UserId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Empty,
    SelectingTickets,
    SelectingConcessions,
    AwaitingPayment,
    Confirmed,
    Expired,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Confirmed | SessionState::Expired | SessionState::Cancelled
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Operation '{operation}' is not valid in state {from:?}")]
    InvalidStateTransition {
        from: SessionState,
        operation: &'static str,
    },

    #[error("Booking session has expired")]
    Expired,

    #[error("No seats or tickets selected")]
    EmptySelection,

    #[error("Unsupported payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Unknown seat id: {0}")]
    UnknownSeat(String),

    #[error("Duplicate seat id in selection: {0}")]
    DuplicateSeat(String),

    #[error(transparent)]
    Concession(#[from] ConcessionError),
}

/// The show a session is booking against, fixed at start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowContext {
    pub movie_id: i64,
    pub cinema_id: String,
    pub showtime_id: String,
}

/// Quantity change for one concession, as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcessionUpdate {
    pub concession_id: String,
    pub quantity: i32,
}

/// Everything the orchestrator needs to commit a session, captured after the
/// readiness checks pass.
#[derive(Debug, Clone)]
pub struct ConfirmIntent {
    pub movie_id: i64,
    pub cinema_id: String,
    pub showtime_id: String,
    pub selection: Selection,
    pub payment_method: PaymentMethod,
    pub total_amount: i32,
    pub concessions: Vec<BookedConcession>,
}

/// Serializable view of a session for read endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub state: SessionState,
    pub context: Option<ShowContext>,
    pub selection: Option<Selection>,
    pub concessions: Vec<BookedConcession>,
    pub payment_method: Option<PaymentMethod>,
    pub total_amount: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One user's in-progress booking.
///
/// The deadline is passive: every mutating operation first checks
/// `expires_at` and forces the Expired transition before doing anything
/// else. Inventory is never touched here; it is committed exactly once by
/// the orchestrator at confirmation.
#[derive(Debug, Clone)]
pub struct BookingSession {
    id: Uuid,
    user_id: UserId,
    context: Option<ShowContext>,
    state: SessionState,
    selection: Option<Selection>,
    concessions: ConcessionLedger,
    payment_method: Option<PaymentMethod>,
    total_amount: i32,
    created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            context: None,
            state: SessionState::Empty,
            selection: None,
            concessions: ConcessionLedger::new(),
            payment_method: None,
            total_amount: 0,
            created_at: now,
            expires_at: now,
        }
    }

    /// Create a session and immediately start it for a show.
    pub fn begin(user_id: UserId, context: ShowContext, window: Duration) -> Self {
        let mut session = Self::new(user_id);
        // start from Empty cannot fail
        let _ = session.start(context, window);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_amount(&self) -> i32 {
        self.total_amount
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            state: self.state,
            context: self.context.clone(),
            selection: self.selection.clone(),
            concessions: self.booked_concessions(),
            payment_method: self.payment_method,
            total_amount: self.total_amount,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }

    /// Begin a booking for a show. Valid from Empty or any terminal state;
    /// resets every field and opens a fresh expiry window.
    pub fn start(&mut self, context: ShowContext, window: Duration) -> Result<(), SessionError> {
        if self.state != SessionState::Empty && !self.state.is_terminal() {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "start",
            });
        }

        let now = Utc::now();
        self.context = Some(context);
        self.selection = None;
        self.concessions.clear();
        self.payment_method = None;
        self.total_amount = 0;
        self.created_at = now;
        self.expires_at = now + window;
        self.state = SessionState::SelectingTickets;
        Ok(())
    }

    /// Replace the seat/ticket selection. From AwaitingPayment this rolls
    /// the session back to SelectingTickets and drops the chosen payment
    /// method.
    pub fn update_selection(&mut self, selection: Selection) -> Result<(), SessionError> {
        self.enforce_deadline()?;

        match self.state {
            SessionState::SelectingTickets | SessionState::SelectingConcessions => {}
            SessionState::AwaitingPayment => {
                self.payment_method = None;
                self.state = SessionState::SelectingTickets;
            }
            from => {
                return Err(SessionError::InvalidStateTransition {
                    from,
                    operation: "update_selection",
                })
            }
        }

        if let Selection::Seats { seats } = &selection {
            let mut seen = std::collections::BTreeSet::new();
            for seat in seats {
                if seatmap::category_of(seat).is_none() {
                    return Err(SessionError::UnknownSeat(seat.clone()));
                }
                if !seen.insert(seat.as_str()) {
                    return Err(SessionError::DuplicateSeat(seat.clone()));
                }
            }
        }

        self.selection = Some(selection);
        self.recompute_total();
        Ok(())
    }

    /// Move from seat selection to the concessions step.
    pub fn proceed_to_concessions(&mut self) -> Result<(), SessionError> {
        self.enforce_deadline()?;

        if self.state != SessionState::SelectingTickets {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "proceed_to_concessions",
            });
        }
        if self.selection.as_ref().map_or(true, Selection::is_empty) {
            return Err(SessionError::EmptySelection);
        }
        self.state = SessionState::SelectingConcessions;
        Ok(())
    }

    /// Apply concession quantity changes. Zero removes a line.
    pub fn update_concessions(
        &mut self,
        catalog: &ConcessionCatalog,
        updates: &[ConcessionUpdate],
    ) -> Result<(), SessionError> {
        self.enforce_deadline()?;

        if self.state != SessionState::SelectingConcessions {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "update_concessions",
            });
        }

        for update in updates {
            self.concessions
                .set_quantity(catalog, &update.concession_id, update.quantity)?;
        }
        self.recompute_total();
        Ok(())
    }

    /// Move to payment. Valid once concessions have been reviewed.
    pub fn proceed_to_payment(&mut self) -> Result<(), SessionError> {
        self.enforce_deadline()?;

        if self.state != SessionState::SelectingConcessions {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "proceed_to_payment",
            });
        }
        if self.selection.as_ref().map_or(true, Selection::is_empty) {
            return Err(SessionError::EmptySelection);
        }
        self.state = SessionState::AwaitingPayment;
        Ok(())
    }

    /// Choose a payment method from the supported set.
    pub fn choose_payment_method(&mut self, method_id: &str) -> Result<(), SessionError> {
        self.enforce_deadline()?;

        if self.state != SessionState::AwaitingPayment {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "choose_payment_method",
            });
        }

        let method = PaymentMethod::parse(method_id)
            .ok_or_else(|| SessionError::InvalidPaymentMethod(method_id.to_string()))?;
        self.payment_method = Some(method);
        Ok(())
    }

    /// Readiness check for confirmation. Returns the commit data without
    /// transitioning; `mark_confirmed` completes the transition after the
    /// orchestrator's side effects succeed.
    pub fn confirm_intent(&mut self) -> Result<ConfirmIntent, SessionError> {
        self.enforce_deadline()?;

        if self.state != SessionState::AwaitingPayment {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "confirm",
            });
        }
        let Some(payment_method) = self.payment_method else {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "confirm",
            });
        };
        let selection = match &self.selection {
            Some(s) if !s.is_empty() => s.clone(),
            _ => return Err(SessionError::EmptySelection),
        };
        if self.total_amount <= 0 {
            return Err(SessionError::EmptySelection);
        }
        let Some(context) = &self.context else {
            // Unreachable past Empty; guard instead of panicking.
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "confirm",
            });
        };

        Ok(ConfirmIntent {
            movie_id: context.movie_id,
            cinema_id: context.cinema_id.clone(),
            showtime_id: context.showtime_id.clone(),
            selection,
            payment_method,
            total_amount: self.total_amount,
            concessions: self.booked_concessions(),
        })
    }

    /// Single-use AwaitingPayment -> Confirmed transition. A second confirm
    /// lands here in the Confirmed state and is rejected, which is what makes
    /// duplicate confirm requests idempotent.
    pub fn mark_confirmed(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::AwaitingPayment {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                operation: "confirm",
            });
        }
        self.state = SessionState::Confirmed;
        Ok(())
    }

    /// User abort. Always succeeds; a no-op when already terminal.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.clear();
        self.state = SessionState::Cancelled;
    }

    /// Force the Expired transition when the deadline has passed. Returns
    /// true when a transition happened.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == SessionState::Empty || self.state.is_terminal() {
            return false;
        }
        if now < self.expires_at {
            return false;
        }
        self.clear();
        self.state = SessionState::Expired;
        true
    }

    fn enforce_deadline(&mut self) -> Result<(), SessionError> {
        if self.expire_if_due(Utc::now()) {
            return Err(SessionError::Expired);
        }
        if self.state == SessionState::Expired {
            return Err(SessionError::Expired);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.selection = None;
        self.concessions.clear();
        self.payment_method = None;
        self.total_amount = 0;
    }

    /// Total is always recomputed from the selection and the ledger, never
    /// adjusted incrementally.
    fn recompute_total(&mut self) {
        let selection_amount = match &self.selection {
            Some(Selection::Seats { seats }) => seats
                .iter()
                .filter_map(|id| seatmap::category_of(id))
                .map(pricing::seat_price)
                .sum(),
            Some(Selection::Tickets { quantity }) => pricing::ticket_price() * *quantity as i32,
            None => 0,
        };
        self.total_amount = selection_amount + self.concessions.total();
    }

    fn booked_concessions(&self) -> Vec<BookedConcession> {
        self.concessions
            .entries()
            .map(|(id, entry)| BookedConcession {
                item: id.to_string(),
                quantity: entry.quantity,
                unit_price: entry.unit_price,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show() -> ShowContext {
        ShowContext {
            movie_id: 603,
            cinema_id: "cgv-landmark".to_string(),
            showtime_id: "st1".to_string(),
        }
    }

    fn window() -> Duration {
        Duration::minutes(15)
    }

    fn seats(ids: &[&str]) -> Selection {
        Selection::Seats {
            seats: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn session_awaiting_payment() -> BookingSession {
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());
        session.update_selection(seats(&["A1", "A2"])).unwrap();
        session.proceed_to_concessions().unwrap();
        session.proceed_to_payment().unwrap();
        session
    }

    #[test]
    fn test_happy_path_totals() {
        let catalog = ConcessionCatalog::standard();
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());
        assert_eq!(session.state(), SessionState::SelectingTickets);

        session.update_selection(seats(&["A1", "A2"])).unwrap();
        assert_eq!(session.total_amount(), 150_000);

        session.proceed_to_concessions().unwrap();
        session
            .update_concessions(
                &catalog,
                &[ConcessionUpdate {
                    concession_id: "combo1".to_string(),
                    quantity: 1,
                }],
            )
            .unwrap();
        assert_eq!(session.total_amount(), 239_000);

        session.proceed_to_payment().unwrap();
        session.choose_payment_method("visa").unwrap();

        let intent = session.confirm_intent().unwrap();
        assert_eq!(intent.total_amount, 239_000);
        assert_eq!(intent.payment_method, PaymentMethod::Visa);

        session.mark_confirmed().unwrap();
        assert_eq!(session.state(), SessionState::Confirmed);
    }

    #[test]
    fn test_category_pricing() {
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());
        session.update_selection(seats(&["A1", "G1", "H5"])).unwrap();
        assert_eq!(session.total_amount(), 75_000 + 110_000 + 250_000);
    }

    #[test]
    fn test_concession_round_trip_restores_ticket_total() {
        let catalog = ConcessionCatalog::standard();
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());
        session.update_selection(Selection::Tickets { quantity: 2 }).unwrap();
        session.proceed_to_concessions().unwrap();

        let add: Vec<ConcessionUpdate> = ["combo1", "combo2", "nachos"]
            .iter()
            .map(|id| ConcessionUpdate {
                concession_id: id.to_string(),
                quantity: 2,
            })
            .collect();
        session.update_concessions(&catalog, &add).unwrap();
        assert!(session.total_amount() > 150_000);

        let remove: Vec<ConcessionUpdate> = ["combo1", "combo2", "nachos"]
            .iter()
            .map(|id| ConcessionUpdate {
                concession_id: id.to_string(),
                quantity: 0,
            })
            .collect();
        session.update_concessions(&catalog, &remove).unwrap();
        assert_eq!(session.total_amount(), 150_000);
    }

    #[test]
    fn test_reselect_rolls_back_payment() {
        let mut session = session_awaiting_payment();
        session.choose_payment_method("visa").unwrap();

        session.update_selection(seats(&["B1"])).unwrap();
        assert_eq!(session.state(), SessionState::SelectingTickets);

        // Payment method was invalidated; confirm is no longer reachable
        session.proceed_to_concessions().unwrap();
        session.proceed_to_payment().unwrap();
        let err = session.confirm_intent().unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition { operation: "confirm", .. }
        ));
    }

    #[test]
    fn test_confirm_requires_payment_method() {
        let mut session = session_awaiting_payment();
        let err = session.confirm_intent().unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition { operation: "confirm", .. }
        ));
    }

    #[test]
    fn test_empty_selection_cannot_proceed() {
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());
        assert!(matches!(
            session.proceed_to_concessions().unwrap_err(),
            SessionError::EmptySelection
        ));

        session.update_selection(seats(&[])).unwrap();
        assert!(matches!(
            session.proceed_to_concessions().unwrap_err(),
            SessionError::EmptySelection
        ));
    }

    #[test]
    fn test_invalid_seat_ids() {
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());

        let err = session.update_selection(seats(&["Z9"])).unwrap_err();
        assert!(matches!(err, SessionError::UnknownSeat(_)));

        let err = session.update_selection(seats(&["A1", "A1"])).unwrap_err();
        assert!(matches!(err, SessionError::DuplicateSeat(_)));
    }

    #[test]
    fn test_invalid_payment_method() {
        let mut session = session_awaiting_payment();
        let err = session.choose_payment_method("bitcoin").unwrap_err();
        assert!(matches!(err, SessionError::InvalidPaymentMethod(_)));
    }

    #[test]
    fn test_expired_session_rejects_operations() {
        let mut session = session_awaiting_payment();
        session.expires_at = Utc::now() - Duration::seconds(1);

        let err = session.update_selection(seats(&["B1"])).unwrap_err();
        assert!(matches!(err, SessionError::Expired));
        assert_eq!(session.state(), SessionState::Expired);

        let err = session.confirm_intent().unwrap_err();
        assert!(matches!(err, SessionError::Expired));
    }

    #[test]
    fn test_start_is_reentrant_after_terminal() {
        let mut session = session_awaiting_payment();
        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelled);

        session.start(show(), window()).unwrap();
        assert_eq!(session.state(), SessionState::SelectingTickets);
        assert_eq!(session.total_amount(), 0);
    }

    #[test]
    fn test_start_rejected_mid_flow() {
        let mut session = session_awaiting_payment();
        let err = session.start(show(), window()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition { operation: "start", .. }
        ));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut session = session_awaiting_payment();
        session.cancel();
        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[test]
    fn test_duplicate_confirm_rejected() {
        let mut session = session_awaiting_payment();
        session.choose_payment_method("visa").unwrap();
        session.confirm_intent().unwrap();
        session.mark_confirmed().unwrap();

        let err = session.mark_confirmed().unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition { operation: "confirm", .. }
        ));
    }

    #[test]
    fn test_concessions_only_in_concession_step() {
        let catalog = ConcessionCatalog::standard();
        let mut session = BookingSession::begin(UserId::new("u1"), show(), window());

        let err = session
            .update_concessions(
                &catalog,
                &[ConcessionUpdate {
                    concession_id: "combo1".to_string(),
                    quantity: 1,
                }],
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidStateTransition { .. }));
    }
}
