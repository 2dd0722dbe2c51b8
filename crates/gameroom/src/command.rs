use super::RoomError;
use serde::Deserialize;
use slap_core::Millis;
use slap_core::NAME_MAX;
use slap_core::NAME_MIN;
use slap_core::ROOM_CODE_ALPHABET;
use slap_core::ROOM_CODE_LENGTH;
use slap_cards::Card;
use slap_engine::UserId;

/// Commands sent from clients over the websocket, schema-validated before
/// any room lock is taken.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    #[serde(rename = "room.create")]
    RoomCreate { display_name: String },
    #[serde(rename = "room.join")]
    RoomJoin {
        room_code: String,
        display_name: String,
        #[serde(default)]
        user_id: Option<UserId>,
    },
    #[serde(rename = "room.leave")]
    RoomLeave {},
    #[serde(rename = "lobby.ready")]
    LobbyReady { ready: bool },
    #[serde(rename = "lobby.kick")]
    LobbyKick { user_id: UserId },
    #[serde(rename = "lobby.start")]
    LobbyStart {},
    #[serde(rename = "game.stop")]
    GameStop {},
    #[serde(rename = "game.flip")]
    GameFlip { client_seq: u64, client_time: Millis },
    #[serde(rename = "game.slap")]
    GameSlap {
        event_id: String,
        #[serde(default)]
        gesture: Option<Card>,
        client_seq: u64,
        client_time: Millis,
        offset_ms: i64,
        rtt_ms: u64,
    },
    #[serde(rename = "ping")]
    Ping { client_time: Millis },
}

impl ClientCommand {
    /// Gameplay inputs subject to the per-connection rate cap.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::GameFlip { .. } | Self::GameSlap { .. })
    }
}

/// Trims and bounds a display name.
pub fn valid_display_name(raw: &str) -> Result<String, RoomError> {
    let name = raw.trim();
    let len = name.chars().count();
    if (NAME_MIN..=NAME_MAX).contains(&len) {
        Ok(name.to_string())
    } else {
        Err(RoomError::InvalidName)
    }
}

/// Normalizes a room code to upper case and checks shape. A malformed code
/// can't name a room, so the failure reads as not-found.
pub fn valid_room_code(raw: &str) -> Result<String, RoomError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == ROOM_CODE_LENGTH && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
        Ok(code)
    } else {
        Err(RoomError::RoomNotFound)
    }
}
