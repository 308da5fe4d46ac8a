use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::require_user;
use crate::bookings::BookingResponse;
use crate::error::ApiError;
use crate::state::AppState;
use cine_booking::{BookingSession, ConcessionUpdate, SessionState, SessionView};
use cine_catalog::Selection;

#[derive(Debug, Deserialize)]
struct StartSessionRequest {
    movie_id: i64,
    cinema_id: String,
    showtime_id: String,
}

#[derive(Debug, Serialize)]
struct StartSessionResponse {
    session_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ConcessionsRequest {
    items: Vec<ConcessionUpdate>,
}

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    method: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(start_session))
        .route("/v1/sessions/{id}", get(get_session).delete(cancel_session))
        .route("/v1/sessions/{id}/selection", put(update_selection))
        .route("/v1/sessions/{id}/concessions", post(update_concessions))
        .route("/v1/sessions/{id}/payment", post(choose_payment))
        .route("/v1/sessions/{id}/confirm", post(confirm))
}

/// Look up a session and verify the caller owns it.
async fn owned_session(
    state: &AppState,
    headers: &HeaderMap,
    id: Uuid,
) -> Result<Arc<Mutex<BookingSession>>, ApiError> {
    let user = require_user(headers)?;
    let handle = state
        .registry
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFoundError(format!("Session not found: {}", id)))?;

    {
        let session = handle.lock().await;
        if *session.user_id() != user {
            return Err(ApiError::AuthorizationError(
                "Session does not belong to the caller".to_string(),
            ));
        }
    }
    Ok(handle)
}

async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let user = require_user(&headers)?;
    let session = state
        .orchestrator
        .start_session(user, req.movie_id, &req.cinema_id, &req.showtime_id)
        .await?;

    let expires_at = session.expires_at;
    let session_id = state.registry.insert(session).await;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            expires_at,
        }),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = owned_session(&state, &headers, id).await?;
    let mut session = handle.lock().await;
    // Reads force the expiry transition too
    session.expire_if_due(Utc::now());
    Ok(Json(session.view()))
}

async fn update_selection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(selection): Json<Selection>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = owned_session(&state, &headers, id).await?;
    let mut session = handle.lock().await;
    session.update_selection(selection)?;
    Ok(Json(session.view()))
}

async fn update_concessions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<ConcessionsRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = owned_session(&state, &headers, id).await?;
    let mut session = handle.lock().await;

    if session.state() == SessionState::SelectingTickets {
        session.proceed_to_concessions()?;
    }
    session.update_concessions(&state.concessions, &req.items)?;
    Ok(Json(session.view()))
}

async fn choose_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = owned_session(&state, &headers, id).await?;
    let mut session = handle.lock().await;

    if session.state() == SessionState::SelectingTickets {
        session.proceed_to_concessions()?;
    }
    if session.state() == SessionState::SelectingConcessions {
        session.proceed_to_payment()?;
    }
    session.choose_payment_method(&req.method)?;
    Ok(Json(session.view()))
}

async fn confirm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let handle = owned_session(&state, &headers, id).await?;
    let mut session = handle.lock().await;

    let booking = state.orchestrator.confirm(&mut session).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn cancel_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = owned_session(&state, &headers, id).await?;
    let mut session = handle.lock().await;
    session.cancel();
    Ok(Json(session.view()))
}
