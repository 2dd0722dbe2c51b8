use super::UserId;
use slap_cards::Card;
use slap_core::Millis;

/// Inputs accepted by the reducer. Client-originated events carry the
/// timing fields needed to estimate reaction times; the rest are posted by
/// the room's timer and control plane.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The seated player reveals the front card of their hand.
    Flip { user_id: UserId },
    /// A slap submission against the window identified by `event_id`.
    Slap {
        user_id: UserId,
        event_id: String,
        gesture: Option<Card>,
        client_seq: u64,
        client_time: Millis,
        offset_ms: i64,
        rtt_ms: u64,
    },
    /// Close the active window now (deadline timer or explicit request).
    ResolveSlapWindow,
    /// The current player idled past the turn timeout.
    TurnTimeout,
    /// Discard the active window without ranking or penalty.
    SkipSlapWindow,
}

impl GameEvent {
    pub fn slap(
        user_id: UserId,
        event_id: impl Into<String>,
        gesture: Option<Card>,
        client_seq: u64,
        client_time: Millis,
        offset_ms: i64,
        rtt_ms: u64,
    ) -> Self {
        Self::Slap {
            user_id,
            event_id: event_id.into(),
            gesture,
            client_seq,
            client_time,
            offset_ms,
            rtt_ms,
        }
    }
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flip { user_id } => write!(f, "flip by {}", user_id),
            Self::Slap {
                user_id, event_id, ..
            } => write!(f, "slap by {} on {}", user_id, event_id),
            Self::ResolveSlapWindow => write!(f, "resolve slap window"),
            Self::TurnTimeout => write!(f, "turn timeout"),
            Self::SkipSlapWindow => write!(f, "skip slap window"),
        }
    }
}
