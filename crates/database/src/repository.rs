use super::PgErr;
use std::sync::Arc;
use tokio_postgres::Client;
use uuid::Uuid;

/// Room lifecycle transitions recorded in the snapshot journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Create,
    Join,
    Leave,
    Start,
    Stop,
    Finish,
    Delete,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Join => "JOIN",
            Self::Leave => "LEAVE",
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Finish => "FINISH",
            Self::Delete => "DELETE",
        }
    }
}

/// Fire-and-forget journal over the SQL tables. Every operation is tried
/// twice; the second failure is logged and swallowed, so callers never
/// block gameplay on persistence health.
#[derive(Clone)]
pub struct Repository {
    client: Arc<Client>,
}

impl Repository {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        super::migrate(&self.client).await
    }

    async fn twice<T, F, Fut>(&self, what: &'static str, op: F) -> Option<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PgErr>>,
    {
        for attempt in 1..=2 {
            match op().await {
                Ok(value) => return Some(value),
                Err(e) => log::warn!("{} failed (attempt {}): {}", what, attempt, e),
            }
        }
        log::error!("{} dropped after retry", what);
        None
    }

    /// Creates or refreshes the room metadata row.
    pub async fn upsert_room_metadata(
        &self,
        room_id: Uuid,
        room_code: &str,
        status: &str,
        host_user_id: Uuid,
        version: i64,
    ) {
        self.twice("upsert room metadata", || {
            let params: [&(dyn tokio_postgres::types::ToSql + Sync); 5] =
                [&room_id, &room_code, &status, &host_user_id, &version];
            async move {
                self.client
                    .execute(
                        "INSERT INTO rooms (id, room_code, status, host_user_id, version)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO UPDATE
                 SET status = $3, host_user_id = $4, version = $5, updated_at = now()",
                        &params,
                    )
                    .await
            }
        })
        .await;
    }

    /// Appends a stripped room snapshot for a lifecycle transition.
    pub async fn write_room_snapshot(
        &self,
        room_id: Uuid,
        transition: TransitionKind,
        version: i64,
        payload: serde_json::Value,
    ) {
        self.twice("write room snapshot", || {
            let transition_str = transition.as_str();
            let payload_ref = &payload;
            async move {
                let params: [&(dyn tokio_postgres::types::ToSql + Sync); 4] =
                    [&room_id, &transition_str, &version, payload_ref];
                self.client
                    .execute(
                        "INSERT INTO room_snapshots (room_id, transition_type, version, payload)
                 VALUES ($1, $2, $3, $4)",
                        &params,
                    )
                    .await
            }
        })
        .await;
    }

    pub async fn mark_room_deleted(&self, room_id: Uuid) {
        self.twice("mark room deleted", || {
            let params: [&(dyn tokio_postgres::types::ToSql + Sync); 1] = [&room_id];
            async move {
                self.client
                    .execute(
                        "UPDATE rooms SET deleted_at = now(), updated_at = now() WHERE id = $1",
                        &params,
                    )
                    .await
            }
        })
        .await;
    }

    /// Opens a match row. On failure no match id binds to the room, so
    /// later match events are simply skipped.
    pub async fn start_match(&self, room_id: Uuid) -> Option<Uuid> {
        let match_id = Uuid::now_v7();
        self.twice("start match", || {
            let params: [&(dyn tokio_postgres::types::ToSql + Sync); 2] = [&match_id, &room_id];
            async move {
                self.client
                    .execute(
                        "INSERT INTO matches (id, room_id) VALUES ($1, $2)",
                        &params,
                    )
                    .await
            }
        })
        .await
        .map(|_| match_id)
    }

    pub async fn finish_match(
        &self,
        match_id: Uuid,
        winner_user_id: Option<Uuid>,
        summary: serde_json::Value,
    ) {
        self.twice("finish match", || {
            let params: [&(dyn tokio_postgres::types::ToSql + Sync); 3] =
                [&match_id, &winner_user_id, &summary];
            async move {
                self.client
                    .execute(
                        "UPDATE matches SET winner_user_id = $2, ended_at = now(), summary = $3
                 WHERE id = $1",
                        &params,
                    )
                    .await
            }
        })
        .await;
    }

    pub async fn append_match_event(
        &self,
        match_id: Uuid,
        event_type: &str,
        payload: serde_json::Value,
    ) {
        self.twice("append match event", || {
            let params: [&(dyn tokio_postgres::types::ToSql + Sync); 3] =
                [&match_id, &event_type, &payload];
            async move {
                self.client
                    .execute(
                        "INSERT INTO match_events (match_id, event_type, payload) VALUES ($1, $2, $3)",
                        &params,
                    )
                    .await
            }
        })
        .await;
    }
}
