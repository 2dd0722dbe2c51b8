use serde::Deserialize;
use serde::Serialize;
use slap_core::EVENT_ID_PREFIX;
use slap_core::ID;
use slap_core::MIN_HUMAN_REACTION_MS;
use slap_core::Millis;
use slap_core::SLAP_WINDOW_ACTION_MS;
use slap_core::SLAP_WINDOW_MATCH_MS;
use slap_core::Seat;
use slap_core::TURN_TIMEOUT_MS;
use slap_core::Version;
use slap_cards::Card;

/// Marker for user identity ids.
pub struct User;
/// Opaque user identity, stable across connections and reconnects.
pub type UserId = ID<User>;

/// A seated player as the engine sees them.
/// The hand front (`hand[0]`) is the next card to flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub user_id: UserId,
    pub display_name: String,
    pub seat_index: Seat,
    pub connected: bool,
    pub ready: bool,
    pub hand: Vec<Card>,
}

/// Match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InGame,
    Finished,
}

/// Why a slap window opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowReason {
    /// Revealed card equals the current chant word.
    Match,
    /// Revealed card is an action card; slaps must carry its gesture.
    Action,
    /// Revealed card repeats the previous reveal.
    SameCard,
}

/// A single slap submission, in server receipt order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlapAttempt {
    pub user_id: UserId,
    pub event_id: String,
    pub gesture: Option<Card>,
    pub client_seq: u64,
    pub client_time: Millis,
    pub offset_ms: i64,
    pub rtt_ms: u64,
    pub received_at: Millis,
}

/// Server-side bookkeeping for the current slap window.
/// At most one window is live per room; outside a window the idle value
/// holds `active = false` and empty attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlapWindow {
    pub active: bool,
    pub resolved: bool,
    pub event_id: String,
    pub reason: Option<WindowReason>,
    pub action_card: Option<Card>,
    pub start: Millis,
    pub deadline: Millis,
    pub slap_window_ms: u64,
    pub flipper_seat: Seat,
    pub attempts: Vec<SlapAttempt>,
}

impl SlapWindow {
    /// The inactive window between reveals.
    pub fn idle() -> Self {
        Self {
            active: false,
            resolved: false,
            event_id: String::new(),
            reason: None,
            action_card: None,
            start: 0,
            deadline: 0,
            slap_window_ms: 0,
            flipper_seat: 0,
            attempts: Vec::new(),
        }
    }
    pub fn is_open(&self) -> bool {
        self.active && !self.resolved
    }
    pub fn received(&self) -> usize {
        self.attempts.len()
    }
    pub fn has_attempt(&self, user: &UserId) -> bool {
        self.attempts.iter().any(|a| a.user_id == *user)
    }
}

/// Injected tunables. The engine never reads process-wide statics; rooms
/// carry their own copy so overrides stay scoped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub slap_window_match_ms: u64,
    pub slap_window_action_ms: u64,
    pub turn_timeout_ms: u64,
    pub min_human_reaction_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            slap_window_match_ms: SLAP_WINDOW_MATCH_MS,
            slap_window_action_ms: SLAP_WINDOW_ACTION_MS,
            turn_timeout_ms: TURN_TIMEOUT_MS,
            min_human_reaction_ms: MIN_HUMAN_REACTION_MS,
        }
    }
}

/// The most recent reveal, kept for SAME_CARD detection and client display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRevealed {
    pub card: Card,
    pub seat: Seat,
}

/// Complete authoritative match state. A plain value: the reducer clones
/// it, mutates the clone, and hands it back, so callers never observe
/// in-place mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub status: GameStatus,
    pub players: Vec<Player>,
    pub current_turn_seat: Seat,
    pub chant_index: usize,
    pub pile: Vec<Card>,
    pub last_revealed: Option<LastRevealed>,
    pub slap_window: SlapWindow,
    pub winner_user_id: Option<UserId>,
    pub version: Version,
    pub next_slap_event_nonce: u64,
    pub config: GameConfig,
}

impl GameState {
    /// The card on top of the pile, if any.
    pub fn pile_top_card(&self) -> Option<Card> {
        self.pile.last().copied()
    }
    pub fn pile_count(&self) -> usize {
        self.pile.len()
    }
    /// The chant word for the next reveal.
    pub fn chant_word(&self) -> Card {
        Card::chant(self.chant_index)
    }
    pub fn seat_of(&self, user: &UserId) -> Option<Seat> {
        self.players
            .iter()
            .find(|p| p.user_id == *user)
            .map(|p| p.seat_index)
    }
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }
    /// Advances the chant cycle; runs on every successful flip, including
    /// the terminal one.
    pub(crate) fn advance_chant(&mut self) {
        self.chant_index = (self.chant_index + 1) % Card::NORMAL.len();
    }
    pub(crate) fn bump(&mut self) {
        self.version += 1;
    }
    /// Mints the next deterministic window id from the nonce sequence.
    pub(crate) fn next_event_id(&mut self) -> String {
        let id = format!("{}{:08x}", EVENT_ID_PREFIX, self.next_slap_event_nonce);
        self.next_slap_event_nonce += 1;
        id
    }
}
