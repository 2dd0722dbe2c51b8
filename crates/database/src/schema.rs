use super::MATCH_EVENTS;
use super::MATCHES;
use super::ROOM_SNAPSHOTS;
use super::ROOMS;
use tokio_postgres::Client;

/// Schema metadata for the journal tables. DDL strings are assembled at
/// compile time via [`const_format::concatcp!`] so table names stay in one
/// place.
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
}

/// Room metadata rows.
pub struct RoomRow;
/// Per-transition snapshot rows.
pub struct SnapshotRow;
/// Match rows.
pub struct MatchRow;
/// Match event journal rows.
pub struct MatchEventRow;

impl Schema for RoomRow {
    fn name() -> &'static str {
        ROOMS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            ROOMS,
            " (
                id            UUID PRIMARY KEY,
                room_code     TEXT NOT NULL,
                status        TEXT NOT NULL,
                host_user_id  UUID NOT NULL,
                version       BIGINT NOT NULL,
                created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
                deleted_at    TIMESTAMPTZ
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_rooms_code ON ",
            ROOMS,
            " (room_code);"
        )
    }
}

impl Schema for SnapshotRow {
    fn name() -> &'static str {
        ROOM_SNAPSHOTS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            ROOM_SNAPSHOTS,
            " (
                id              BIGSERIAL PRIMARY KEY,
                room_id         UUID NOT NULL,
                transition_type TEXT NOT NULL,
                version         BIGINT NOT NULL,
                payload         JSONB NOT NULL,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_room_snapshots_room ON ",
            ROOM_SNAPSHOTS,
            " (room_id);"
        )
    }
}

impl Schema for MatchRow {
    fn name() -> &'static str {
        MATCHES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            MATCHES,
            " (
                id             UUID PRIMARY KEY,
                room_id        UUID NOT NULL,
                winner_user_id UUID,
                started_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
                ended_at       TIMESTAMPTZ,
                summary        JSONB
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_matches_room ON ",
            MATCHES,
            " (room_id);"
        )
    }
}

impl Schema for MatchEventRow {
    fn name() -> &'static str {
        MATCH_EVENTS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            MATCH_EVENTS,
            " (
                id         BIGSERIAL PRIMARY KEY,
                match_id   UUID NOT NULL,
                event_type TEXT NOT NULL,
                payload    JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_match_events_match ON ",
            MATCH_EVENTS,
            " (match_id);"
        )
    }
}

/// Creates every journal table and index. Idempotent; runs at startup when
/// persistence is enabled.
pub async fn migrate(client: &Client) -> anyhow::Result<()> {
    for ddl in [
        RoomRow::creates(),
        SnapshotRow::creates(),
        MatchRow::creates(),
        MatchEventRow::creates(),
        RoomRow::indices(),
        SnapshotRow::indices(),
        MatchRow::indices(),
        MatchEventRow::indices(),
    ] {
        client.batch_execute(ddl).await?;
    }
    log::info!("database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn ddl_names_every_table() {
        assert!(RoomRow::creates().contains(ROOMS));
        assert!(SnapshotRow::creates().contains(ROOM_SNAPSHOTS));
        assert!(MatchRow::creates().contains(MATCHES));
        assert!(MatchEventRow::creates().contains(MATCH_EVENTS));
    }
    #[test]
    fn snapshot_and_event_payloads_are_jsonb() {
        assert!(SnapshotRow::creates().contains("JSONB"));
        assert!(MatchEventRow::creates().contains("JSONB"));
    }
}
