//! Deterministic game engine for SlapHard.
//!
//! The engine is a pure state-transition function over [`GameState`]: it
//! reads no clocks, no randomness, and performs no I/O — every source of
//! nondeterminism (the current server time, the shuffle seed) is an input.
//! Callers feed it [`GameEvent`]s and receive a fresh state plus a list of
//! [`Effect`] descriptors to broadcast and journal.
//!
//! ## Modules
//!
//! - [`state`](GameState) — Value types: players, pile, slap window, config
//! - [`event`](GameEvent) — Inputs accepted by the reducer
//! - [`effect`](Effect) — Outputs the orchestrator fans out
//! - [`apply`] — The reducer itself: flips, slaps, resolutions, penalties
//! - [`deal`](GameState::deal) — Seeded initial state construction
//! - [`view`](GameStateView) — Per-player projection that hides hands
mod apply;
mod deal;
mod effect;
mod error;
mod event;
mod state;
mod view;

pub use apply::*;
pub use deal::*;
pub use effect::*;
pub use error::*;
pub use event::*;
pub use state::*;
pub use view::*;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use slap_cards::Card;

    /// Stable user ids so ordering assertions stay readable.
    pub fn uid(n: u128) -> UserId {
        uuid::Uuid::from_u128(n).into()
    }
    pub fn entrants(n: usize) -> Vec<(UserId, String)> {
        (1..=n)
            .map(|i| (uid(i as u128), format!("u{}", i)))
            .collect()
    }
    /// Deals `deck` unshuffled to `n` players named u1..un.
    pub fn state_with(n: usize, deck: &[Card]) -> GameState {
        GameState::deal(
            &entrants(n),
            GameConfig::default(),
            DealOptions {
                seed: None,
                deck: Some(deck.to_vec()),
                shuffle: false,
            },
        )
        .expect("test deal")
    }
    pub fn two_player_state(deck: &[Card]) -> GameState {
        state_with(2, deck)
    }
}
