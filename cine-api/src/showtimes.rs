use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;
use cine_catalog::seatmap::{standard_seat_map, SeatCategory};
use cine_catalog::{Concession, ShowtimeInventory};

#[derive(Debug, Serialize)]
struct SeatStatusView {
    id: String,
    category: SeatCategory,
    occupied: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SeatMapResponse {
    Seated {
        showtime_id: String,
        seats: Vec<SeatStatusView>,
    },
    Capacity {
        showtime_id: String,
        remaining: u32,
        total: u32,
    },
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/showtimes/{id}/seats", get(seat_map))
        .route("/v1/concessions", get(list_concessions))
}

async fn list_concessions(State(state): State<AppState>) -> Json<Vec<Concession>> {
    Json(state.concessions.items().cloned().collect())
}

async fn seat_map(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeatMapResponse>, ApiError> {
    state
        .catalog
        .get_showtime(&id)
        .await
        .map_err(|e| ApiError::Anyhow(e.into()))?
        .ok_or_else(|| ApiError::NotFoundError(format!("Showtime not found: {}", id)))?;

    let inventory = state
        .inventory
        .seat_view(&id)
        .await?
        .ok_or_else(|| ApiError::NotFoundError(format!("Showtime not found: {}", id)))?;

    let response = match inventory {
        ShowtimeInventory::Seated { booked, .. } => SeatMapResponse::Seated {
            showtime_id: id,
            seats: standard_seat_map()
                .into_iter()
                .map(|seat| SeatStatusView {
                    occupied: booked.contains(&seat.id),
                    id: seat.id,
                    category: seat.category,
                })
                .collect(),
        },
        ShowtimeInventory::Capacity { remaining, total } => SeatMapResponse::Capacity {
            showtime_id: id,
            remaining,
            total,
        },
    };

    Ok(Json(response))
}
