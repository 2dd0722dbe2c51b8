use super::GameState;
use super::GameStatus;
use super::LastRevealed;
use super::UserId;
use super::WindowReason;
use serde::Serialize;
use slap_cards::Card;
use slap_core::Millis;
use slap_core::Seat;
use slap_core::Version;

/// A player as other players may see them. Only the recipient's own entry
/// carries hand contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: UserId,
    pub display_name: String,
    pub seat_index: Seat,
    pub connected: bool,
    pub ready: bool,
    pub hand_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
}

/// The slap window with server-only bookkeeping stripped: attempts collapse
/// to an ordered id list and the flipper seat is withheld.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlapWindowView {
    pub active: bool,
    pub resolved: bool,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<WindowReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_card: Option<Card>,
    pub start_server_time: Millis,
    pub deadline_server_time: Millis,
    pub slap_window_ms: u64,
    pub slapped_user_ids: Vec<UserId>,
    pub received_slaps_count: usize,
}

/// Per-recipient projection of [`GameState`]. Deterministic, side-effect
/// free, and the only type allowed to cross the wire as a game snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub status: GameStatus,
    pub players: Vec<PlayerView>,
    pub current_turn_seat: Seat,
    pub chant_index: usize,
    pub pile_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pile_top_card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_revealed: Option<LastRevealed>,
    pub slap_window: SlapWindowView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_user_id: Option<UserId>,
    pub version: Version,
}

impl GameStateView {
    /// Projects the authoritative state for one recipient.
    pub fn project(state: &GameState, me: &UserId) -> Self {
        let players = state
            .players
            .iter()
            .map(|p| PlayerView {
                user_id: p.user_id,
                display_name: p.display_name.clone(),
                seat_index: p.seat_index,
                connected: p.connected,
                ready: p.ready,
                hand_count: p.hand.len(),
                hand: (p.user_id == *me).then(|| p.hand.clone()),
            })
            .collect();
        let window = &state.slap_window;
        Self {
            status: state.status,
            players,
            current_turn_seat: state.current_turn_seat,
            chant_index: state.chant_index,
            pile_count: state.pile_count(),
            pile_top_card: state.pile_top_card(),
            last_revealed: state.last_revealed,
            slap_window: SlapWindowView {
                active: window.active,
                resolved: window.resolved,
                event_id: window.event_id.clone(),
                reason: window.reason,
                action_card: window.action_card,
                start_server_time: window.start,
                deadline_server_time: window.deadline,
                slap_window_ms: window.slap_window_ms,
                slapped_user_ids: window.attempts.iter().map(|a| a.user_id).collect(),
                received_slaps_count: window.received(),
            },
            winner_user_id: state.winner_user_id,
            version: state.version,
        }
    }
}
