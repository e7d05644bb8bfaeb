use crate::SessionError;
use crate::config::http_base_url;
use hush_core::RoomCode;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomIssued {
    room_id: RoomCode,
}

/// Asks the relay for a fresh room code (`POST /rooms`).
pub async fn create_room(server_url: &str) -> Result<RoomCode, SessionError> {
    let url = format!("{}/rooms", http_base_url(server_url));
    let issued: RoomIssued = reqwest::Client::new()
        .post(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    info!("Relay issued room {}", issued.room_id);
    Ok(issued.room_id)
}

/// Whether the relay has issued `code` (`GET /rooms/{code}`).
pub async fn room_exists(server_url: &str, code: &RoomCode) -> Result<bool, SessionError> {
    let url = format!("{}/rooms/{}", http_base_url(server_url), code);
    let response = reqwest::get(&url).await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(false);
    }
    response.error_for_status()?;
    Ok(true)
}
