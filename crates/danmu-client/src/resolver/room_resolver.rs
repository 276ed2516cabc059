//! Room id lookup over HTTP

use danmu_common::ResolverConfig;
use danmu_core::RoomId;
use reqwest::Client;
use serde_json::Value;

use super::ResolveError;

/// JSON pointer of the canonical id in the lookup response
const ROOM_ID_POINTER: &str = "/data/room_id";

/// Resolves user-facing room numbers to canonical room ids
#[derive(Debug, Clone)]
pub struct RoomResolver {
    client: Client,
    base_url: String,
}

impl RoomResolver {
    /// Create a resolver from config
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.room_init_url.clone(),
        })
    }

    /// Look up the canonical id for `room`
    ///
    /// Sends `GET {room_init_url}{room}` and reads `data.room_id` from the
    /// JSON body.
    pub async fn resolve(&self, room: u64) -> Result<RoomId, ResolveError> {
        let url = format!("{}{room}", self.base_url);
        tracing::debug!(url = %url, "Resolving room id");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let room_id = extract_room_id(&body)?;

        tracing::info!(room = room, room_id = %room_id, "Room resolved");
        Ok(room_id)
    }
}

fn extract_room_id(body: &Value) -> Result<RoomId, ResolveError> {
    let raw = body
        .pointer(ROOM_ID_POINTER)
        .and_then(Value::as_u64)
        .ok_or(ResolveError::MissingRoomId)?;
    Ok(RoomId::new(raw)?)
}
