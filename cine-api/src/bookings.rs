use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::require_user;
use crate::error::ApiError;
use crate::state::AppState;
use cine_booking::{Booking, BookingStatus, BookedConcession, PaymentStatus};
use cine_catalog::Selection;
use cine_core::PaymentMethod;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_code: String,
    pub movie_id: i64,
    pub cinema_id: String,
    pub showtime_id: String,
    pub selection: Selection,
    pub concessions: Vec<BookedConcession>,
    pub total_amount: i32,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_code: booking.booking_code,
            movie_id: booking.movie_id,
            cinema_id: booking.cinema_id,
            showtime_id: booking.showtime_id,
            selection: booking.selection,
            concessions: booking.concessions,
            total_amount: booking.total_amount,
            payment_method: booking.payment_method,
            payment_status: booking.payment_status,
            status: booking.status,
            expires_at: booking.expires_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/{code}", get(get_booking).delete(cancel_booking))
}

async fn get_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = require_user(&headers)?;
    let booking = state.orchestrator.get_booking(&code, &user).await?;
    Ok(Json(booking.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = require_user(&headers)?;
    let booking = state.orchestrator.cancel_booking(&code, &user).await?;
    tracing::info!(booking_code = %code, "Booking cancelled via API");
    Ok(Json(booking.into()))
}
