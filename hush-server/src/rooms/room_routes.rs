use crate::rooms::RoomRegistry;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hush_core::RoomCode;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_id: RoomCode,
}

/// `POST /rooms`
pub async fn create_room(State(rooms): State<RoomRegistry>) -> (StatusCode, Json<RoomCreated>) {
    let room_id = rooms.issue();
    (StatusCode::CREATED, Json(RoomCreated { room_id }))
}

/// `GET /rooms/{code}`
pub async fn get_room(Path(code): Path<String>, State(rooms): State<RoomRegistry>) -> Response {
    let code = match code.parse::<RoomCode>() {
        Ok(code) => code,
        Err(e) => {
            debug!("Rejected room lookup '{}': {}", code, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    if rooms.contains(&code) {
        Json(RoomCreated { room_id: code }).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
