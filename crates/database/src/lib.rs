//! Durable journal for rooms and matches.
//!
//! Gameplay never waits on this layer: every write is attempted with one
//! retry, and a second failure is logged and swallowed so the live game
//! continues (see [`Repository`]).
//!
//! ## Connectivity
//!
//! - [`db()`] — Establishes a database connection from a URL
//!
//! ## Schema
//!
//! - [`Schema`] — Table metadata and DDL generation per record type
//!
//! ## Table Names
//!
//! Constants for the persisted entities: rooms, room snapshots, matches,
//! and match events.
mod repository;
mod schema;

pub use repository::*;
pub use schema::*;

use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes a database connection and spawns its driver task.
/// Returns an `Arc<Client>` suitable for sharing across async tasks.
pub async fn db(url: &str) -> anyhow::Result<Arc<Client>> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection terminated: {}", e);
        }
    });
    Ok(Arc::new(client))
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for room metadata.
#[rustfmt::skip]
pub const ROOMS:          &str = "rooms";
/// Table for per-transition room snapshots.
#[rustfmt::skip]
pub const ROOM_SNAPSHOTS: &str = "room_snapshots";
/// Table for matches played inside rooms.
#[rustfmt::skip]
pub const MATCHES:        &str = "matches";
/// Table for the append-only match event journal.
#[rustfmt::skip]
pub const MATCH_EVENTS:   &str = "match_events";
