//! Card primitives for SlapHard.
//!
//! - [`Card`] — The eight card faces, split into normal (chantable) and
//!   action (gesture) sets
//! - [`deck`] — Default deck composition and validation
//! - [`ChantRng`] — Seeded 32-bit PRNG and Fisher–Yates shuffle with a
//!   fixed cross-implementation contract
mod card;
mod deck;
mod rng;

pub use card::*;
pub use deck::*;
pub use rng::*;
