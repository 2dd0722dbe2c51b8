use super::RoomId;
use super::RoomState;
use slap_engine::UserId;

/// Abstract room store with three indexes: by room id, by room code, and
/// by member user id. Saves establish all three with a TTL; reads hand
/// back deep copies, so caller mutations stay invisible until the next
/// save. The orchestrator treats the store as linearizable per room id —
/// it only ever writes under that room's worker.
#[async_trait::async_trait]
pub trait RoomStore: Send + Sync {
    async fn room_by_id(&self, id: RoomId) -> anyhow::Result<Option<RoomState>>;
    async fn room_by_code(&self, code: &str) -> anyhow::Result<Option<RoomState>>;
    async fn save(&self, room: &RoomState) -> anyhow::Result<()>;
    async fn delete(&self, room: &RoomState) -> anyhow::Result<()>;
    async fn set_user_room(&self, user: UserId, room: RoomId) -> anyhow::Result<()>;
    async fn user_room(&self, user: UserId) -> anyhow::Result<Option<RoomId>>;
    async fn clear_user_room(&self, user: UserId) -> anyhow::Result<()>;
}
