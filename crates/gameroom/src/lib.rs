//! Room orchestration for SlapHard.
//!
//! This crate is the imperative shell around the functional core in
//! `slap-engine`: it serializes every mutation of a room behind a per-room
//! worker task, drives the turn and slap-window timers, fans state out to
//! connections, and keeps the room store and persistence journal fed.
//!
//! ## Architecture
//!
//! - [`Parlor`] — Top-level manager: owns the connection registry and one
//!   worker handle per live room
//! - [`Worker`](parlor) — Per-room serialized command loop; commands, timer
//!   fires, and disconnects all queue here
//! - [`RoomStore`] — Abstract room state store with in-memory and Redis
//!   implementations
//! - [`Registry`] — socket ↔ user ↔ room identity plumbing
//!
//! ## Wire protocol
//!
//! - [`ClientCommand`] — Inbound commands (`room.create`, `game.slap`, ...)
//! - [`ServerMessage`] — Outbound events (`room.state`, `game.slapResult`, ...)
mod code;
mod command;
mod dedup;
mod error;
mod limiter;
mod memory;
mod message;
mod parlor;
mod redis_store;
mod registry;
mod room;
mod store;
mod timer;
mod worker;

pub use code::*;
pub use command::*;
pub use dedup::*;
pub use error::*;
pub use limiter::*;
pub use memory::*;
pub use message::*;
pub use parlor::*;
pub use redis_store::*;
pub use registry::*;
pub use room::*;
pub use store::*;
pub use timer::*;
pub(crate) use worker::*;

#[cfg(test)]
pub(crate) mod tests {
    use slap_cards::Card;
    use slap_engine::DealOptions;
    use slap_engine::GameConfig;
    use slap_engine::GameState;
    use slap_engine::UserId;

    pub fn uid(n: u128) -> UserId {
        uuid::Uuid::from_u128(n).into()
    }
    /// An unshuffled in-progress game for n players named u1..un.
    pub fn game_of(n: usize, deck: &[Card]) -> GameState {
        let entrants: Vec<(UserId, String)> = (1..=n)
            .map(|i| (uid(i as u128), format!("u{}", i)))
            .collect();
        GameState::deal(
            &entrants,
            GameConfig::default(),
            DealOptions {
                seed: None,
                deck: Some(deck.to_vec()),
                shuffle: false,
            },
        )
        .expect("test deal")
    }
}
