use super::UserId;
use super::WindowReason;
use serde::Deserialize;
use serde::Serialize;
use slap_cards::Card;
use slap_core::Millis;

/// How a resolved window picked its loser (or winner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlapResultReason {
    /// Nobody slapped; the flipper eats the pile.
    NoSlaps,
    /// Somebody sat on their hands; the last non-slapper in seat order loses.
    NonSlapper,
    /// Everyone slapped (or SAME_CARD); the slowest ranked slap loses.
    LastSlapper,
    /// A hand-empty player landed the first valid slap and wins the match.
    FirstValidSlapWin,
}

/// What a player is being punished for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PenaltyKind {
    /// Slap with no open window, or against a stale window id.
    FalseSlap,
    /// ACTION slap with a missing or mismatched gesture.
    WrongGesture,
    /// Idled past the turn timer.
    TurnTimeout,
    /// Window expired with zero attempts; charged to the flipper.
    NoSlaps,
}

/// Effect records emitted alongside each state transition. The orchestrator
/// translates them into wire broadcasts and journal entries; they carry no
/// transport detail.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SlapWindowOpen {
        event_id: String,
        reason: WindowReason,
        action_card: Option<Card>,
        start: Millis,
        deadline: Millis,
        slap_window_ms: u64,
    },
    SlapResult {
        event_id: String,
        ordered_user_ids: Vec<UserId>,
        loser_user_id: Option<UserId>,
        reason: SlapResultReason,
        pile_taken: usize,
    },
    Penalty {
        user_id: UserId,
        kind: PenaltyKind,
        pile_taken: usize,
    },
    GameFinished {
        winner_user_id: UserId,
    },
}

impl Effect {
    /// Journal event type for the match-event table.
    pub fn journal_type(&self) -> &'static str {
        match self {
            Self::SlapWindowOpen { .. } => "SLAP_WINDOW_OPEN",
            Self::SlapResult { .. } => "SLAP_RESULT",
            Self::Penalty {
                kind: PenaltyKind::TurnTimeout,
                ..
            } => "TIMEOUT",
            Self::Penalty { .. } => "PENALTY",
            Self::GameFinished { .. } => "WIN",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlapWindowOpen {
                event_id, reason, ..
            } => write!(f, "window {} open ({:?})", event_id, reason),
            Self::SlapResult {
                event_id,
                loser_user_id,
                reason,
                ..
            } => match loser_user_id {
                Some(loser) => write!(f, "window {} resolved: {} loses ({:?})", event_id, loser, reason),
                None => write!(f, "window {} resolved ({:?})", event_id, reason),
            },
            Self::Penalty { user_id, kind, .. } => write!(f, "penalty {:?} on {}", kind, user_id),
            Self::GameFinished { winner_user_id } => write!(f, "game won by {}", winner_user_id),
        }
    }
}
