use super::RoomError;
use serde::Deserialize;
use serde::Serialize;
use slap_core::ID;
use slap_core::MAX_PLAYERS;
use slap_core::Millis;
use slap_core::Seat;
use slap_core::Version;
use slap_engine::GameState;
use slap_engine::UserId;

/// Typed room identifier.
pub type RoomId = ID<RoomState>;

/// Room lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Lobby,
    InGame,
    Finished,
}

impl RoomStatus {
    /// Wire and persistence label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "LOBBY",
            Self::InGame => "IN_GAME",
            Self::Finished => "FINISHED",
        }
    }
}

/// A room member as everyone may see them: no hand contents, ever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
    pub seat_index: Seat,
    pub ready: bool,
    pub connected: bool,
}

/// Authoritative room record as held in the room store. The engine state
/// rides along only while a match is live or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub room_id: RoomId,
    pub room_code: String,
    pub status: RoomStatus,
    pub host_user_id: UserId,
    pub players: Vec<Member>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameState>,
    pub version: Version,
    pub created_at: Millis,
    pub updated_at: Millis,
}

/// Public projection of a room for `room.state` events and persistence
/// snapshots: membership and phase, nothing engine-internal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: RoomId,
    pub room_code: String,
    pub status: RoomStatus,
    pub host_user_id: UserId,
    pub players: Vec<Member>,
    pub version: Version,
}

impl RoomState {
    /// A fresh lobby with the creator seated as host.
    pub fn create(room_code: String, host: UserId, display_name: String, now: Millis) -> Self {
        Self {
            room_id: RoomId::default(),
            room_code,
            status: RoomStatus::Lobby,
            host_user_id: host,
            players: vec![Member {
                user_id: host,
                display_name,
                seat_index: 0,
                ready: false,
                connected: true,
            }],
            game_state: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn member(&self, user: &UserId) -> Option<&Member> {
        self.players.iter().find(|m| m.user_id == *user)
    }
    pub fn member_mut(&mut self, user: &UserId) -> Option<&mut Member> {
        self.players.iter_mut().find(|m| m.user_id == *user)
    }
    pub fn is_host(&self, user: &UserId) -> bool {
        self.host_user_id == *user
    }
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Seats a new member at the end of the table.
    pub fn add_member(&mut self, user: UserId, display_name: String) -> Result<(), RoomError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull);
        }
        self.players.push(Member {
            user_id: user,
            display_name,
            seat_index: self.players.len(),
            ready: false,
            connected: true,
        });
        Ok(())
    }

    /// Removes a member and re-establishes the dense seat prefix. The host
    /// role falls to the lowest remaining seat when the host departs.
    pub fn remove_member(&mut self, user: &UserId) {
        self.players.retain(|m| m.user_id != *user);
        self.reseat();
        if self.host_user_id == *user {
            if let Some(next) = self.players.first() {
                self.host_user_id = next.user_id;
            }
        }
    }

    fn reseat(&mut self) {
        for (seat, member) in self.players.iter_mut().enumerate() {
            member.seat_index = seat;
        }
    }

    /// Flags a member (and their engine seat, if any) connected or not.
    pub fn set_connected(&mut self, user: &UserId, connected: bool) {
        if let Some(member) = self.member_mut(user) {
            member.connected = connected;
        }
        if let Some(game) = self.game_state.as_mut() {
            if let Some(player) = game.players.iter_mut().find(|p| p.user_id == *user) {
                player.connected = connected;
            }
        }
    }

    /// Bumps the room version and activity stamp; every broadcastable
    /// mutation passes through here.
    pub fn touch(&mut self, now: Millis) {
        self.version += 1;
        self.updated_at = now;
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            room_id: self.room_id,
            room_code: self.room_code.clone(),
            status: self.status,
            host_user_id: self.host_user_id,
            players: self.players.clone(),
            version: self.version,
        }
    }
}
