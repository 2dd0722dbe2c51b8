use slap_engine::GameError;

/// Room-level failures, by wire-stable code. Engine rejections pass
/// through [`RoomError::Game`] with their code verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    InvalidName,
    RoomNotFound,
    RoomFull,
    NotInLobby,
    NotInGame,
    NotHost,
    InvalidTarget,
    RateLimited,
    Internal,
    Game(GameError),
}

impl RoomError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName => "INVALID_NAME",
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::NotInLobby => "NOT_IN_LOBBY",
            Self::NotInGame => "NOT_IN_GAME",
            Self::NotHost => "NOT_HOST",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::RateLimited => "RATE_LIMITED",
            Self::Internal => "INTERNAL_ERROR",
            Self::Game(e) => e.code(),
        }
    }
    /// True if the offending socket should get fresh snapshots alongside
    /// the error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Game(e) => e.is_recoverable(),
            _ => false,
        }
    }
    /// True if the error is swallowed instead of reported.
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Game(e) => e.is_silent(),
            _ => false,
        }
    }
    /// Short human-readable message for the `error` event.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidName => "display name must be 2-24 characters",
            Self::RoomNotFound => "room not found",
            Self::RoomFull => "room is full",
            Self::NotInLobby => "room is not in the lobby",
            Self::NotInGame => "no game in progress",
            Self::NotHost => "only the host can do that",
            Self::InvalidTarget => "that player cannot be kicked",
            Self::RateLimited => "too many inputs, slow down",
            Self::Internal => "internal error",
            Self::Game(GameError::NotYourTurn) => "not your turn",
            Self::Game(GameError::SlapWindowActive) => "a slap window is open",
            Self::Game(GameError::NoSlapWindow) => "no slap window is open",
            Self::Game(GameError::InvalidEventId) => "slap does not match the open window",
            Self::Game(GameError::AlreadySlapped) => "already slapped",
            Self::Game(GameError::NotInGame) => "no game in progress",
            Self::Game(GameError::InternalError) => "internal error",
        }
    }
}

impl From<GameError> for RoomError {
    fn from(e: GameError) -> Self {
        Self::Game(e)
    }
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for RoomError {}
