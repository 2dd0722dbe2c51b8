/// Engine-rejectable events, by wire-stable code.
/// Codes surface verbatim in the `error` event; the recoverable subset
/// additionally triggers a snapshot resync for the offending socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    NotInGame,
    SlapWindowActive,
    NotYourTurn,
    NoSlapWindow,
    InvalidEventId,
    AlreadySlapped,
    InternalError,
}

impl GameError {
    /// The wire-stable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInGame => "NOT_IN_GAME",
            Self::SlapWindowActive => "SLAP_WINDOW_ACTIVE",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::NoSlapWindow => "NO_SLAP_WINDOW",
            Self::InvalidEventId => "INVALID_EVENT_ID",
            Self::AlreadySlapped => "ALREADY_SLAPPED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
    /// True if the client most likely acted on a stale snapshot and should
    /// be resynced rather than scolded.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotYourTurn
                | Self::SlapWindowActive
                | Self::NoSlapWindow
                | Self::InvalidEventId
                | Self::AlreadySlapped
        )
    }
    /// True for duplicate slaps, which are dropped without telling anyone.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::AlreadySlapped)
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for GameError {}
