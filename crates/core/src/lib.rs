//! Core type aliases, identity types, and constants for the SlapHard backend.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Seat index around the table (0-based, dense).
pub type Seat = usize;
/// Server-side timestamps and durations in milliseconds since the Unix epoch.
pub type Millis = u64;
/// Monotone state version, bumped on every broadcastable mutation.
pub type Version = u64;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Typed uuid so a room id, user id, and connection id can never be mixed
/// up at a call site. The marker is phantom; on the wire and in the store
/// this is a plain uuid.
pub struct ID<T> {
    uuid: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    /// The untyped uuid, for SQL parameters and key formatting.
    pub fn uuid(&self) -> uuid::Uuid {
        self.uuid
    }
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(uuid: uuid::Uuid) -> Self {
        Self {
            uuid,
            marker: PhantomData,
        }
    }
}
impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.uuid
    }
}

/// Fresh ids are time-ordered (v7) so store keys and log lines sort by
/// creation.
impl<T> Default for ID<T> {
    fn default() -> Self {
        Self::from(uuid::Uuid::now_v7())
    }
}

// The phantom marker must not infect the derives, so these are by hand.
impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}
impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.uuid.cmp(&other.uuid)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Hash for ID<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<T> fmt::Debug for ID<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID({})", self.uuid)
    }
}
impl<T> fmt::Display for ID<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.uuid.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// TABLE PARAMETERS
// ============================================================================
/// Minimum players required to start a match.
pub const MIN_PLAYERS: usize = 2;
/// Maximum players a room can seat.
pub const MAX_PLAYERS: usize = 8;
/// Display name length bounds, applied after trimming.
pub const NAME_MIN: usize = 2;
/// Upper display name bound.
pub const NAME_MAX: usize = 24;

// ============================================================================
// SLAP WINDOW PARAMETERS
// ============================================================================
/// Window length for MATCH and SAME_CARD reveals.
pub const SLAP_WINDOW_MATCH_MS: u64 = 2000;
/// Window length for ACTION reveals (players must also recall the gesture).
pub const SLAP_WINDOW_ACTION_MS: u64 = 3200;
/// Floor for estimated reaction times; anything faster is clock skew.
pub const MIN_HUMAN_REACTION_MS: u64 = 60;
/// Reaction estimates are capped at window length plus this slack.
pub const REACTION_CAP_SLACK_MS: u64 = 2000;
/// Prefix for deterministic slap-window event ids.
pub const EVENT_ID_PREFIX: &str = "slap-";

// ============================================================================
// ROOM PARAMETERS
// ============================================================================
/// Idle turn timeout before the current player is penalized.
pub const TURN_TIMEOUT_MS: u64 = 5000;
/// Minimum gap between gameplay inputs from a single connection.
pub const RATE_LIMIT_GAP_MS: u64 = 40;
/// Room store entries expire after this much inactivity.
pub const ROOM_TTL_SECS: u64 = 3600;
/// Grace period during which late slaps against a resolved window are dropped.
pub const LATE_SLAP_GRACE_MS: u64 = 250;
/// Room code length.
pub const ROOM_CODE_LENGTH: usize = 6;
/// Room code alphabet: A-Z and 0-9 minus the visually ambiguous I, O, 1, 0.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Collision retries before room creation gives up.
pub const ROOM_CODE_RETRIES: usize = 20;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Current server time in milliseconds since the Unix epoch. The engine
/// never calls this; orchestration samples it once per handled event.
pub fn now_ms() -> Millis {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_millis() as Millis
}

/// Initialize logging: INFO to the terminal, and when a log directory is
/// configured, DEBUG to a timestamped file inside it as well.
#[cfg(feature = "server")]
pub fn init_logging(log_dir: Option<&str>) {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let mut sinks: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];
    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir).expect("create log directory");
        let stamp = now_ms() / 1000;
        let file = std::fs::File::create(format!("{}/{}.log", dir, stamp))
            .expect("create log file");
        sinks.push(simplelog::WriteLogger::new(
            log::LevelFilter::Debug,
            config,
            file,
        ));
    }
    simplelog::CombinedLogger::init(sinks).expect("initialize logger");
}

/// Register a Ctrl+C handler that exits immediately; room state lives in
/// the store, so there is nothing to flush on the way out.
#[cfg(feature = "server")]
pub fn trap_interrupt() {
    tokio::spawn(async {
        tokio::signal::ctrl_c().await.expect("install ctrl-c handler");
        println!();
        log::warn!("interrupt received, shutting down");
        std::process::exit(0);
    });
}
