use super::RoomId;
use super::RoomState;
use super::RoomStore;
use slap_core::ROOM_TTL_SECS;
use slap_engine::UserId;
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn fresh(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }
    fn live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Single-process room store: the authoritative fallback when no external
/// key-value store is configured. Expiry is enforced lazily on read.
pub struct MemoryStore {
    ttl: Duration,
    rooms: RwLock<HashMap<RoomId, Entry<RoomState>>>,
    codes: RwLock<HashMap<String, Entry<RoomId>>>,
    users: RwLock<HashMap<UserId, Entry<RoomId>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(ROOM_TTL_SECS))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            rooms: RwLock::new(HashMap::new()),
            codes: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl RoomStore for MemoryStore {
    async fn room_by_id(&self, id: RoomId) -> anyhow::Result<Option<RoomState>> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(&id).filter(|e| e.live()).map(|e| e.value.clone()))
    }

    async fn room_by_code(&self, code: &str) -> anyhow::Result<Option<RoomState>> {
        let id = {
            let codes = self.codes.read().await;
            codes.get(code).filter(|e| e.live()).map(|e| e.value)
        };
        match id {
            Some(id) => self.room_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn save(&self, room: &RoomState) -> anyhow::Result<()> {
        let mut rooms = self.rooms.write().await;
        let mut codes = self.codes.write().await;
        let mut users = self.users.write().await;
        rooms.insert(room.room_id, Entry::fresh(room.clone(), self.ttl));
        codes.insert(room.room_code.clone(), Entry::fresh(room.room_id, self.ttl));
        for member in &room.players {
            users.insert(member.user_id, Entry::fresh(room.room_id, self.ttl));
        }
        Ok(())
    }

    async fn delete(&self, room: &RoomState) -> anyhow::Result<()> {
        let mut rooms = self.rooms.write().await;
        let mut codes = self.codes.write().await;
        let mut users = self.users.write().await;
        rooms.remove(&room.room_id);
        codes.remove(&room.room_code);
        for member in &room.players {
            users.remove(&member.user_id);
        }
        Ok(())
    }

    async fn set_user_room(&self, user: UserId, room: RoomId) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        users.insert(user, Entry::fresh(room, self.ttl));
        Ok(())
    }

    async fn user_room(&self, user: UserId) -> anyhow::Result<Option<RoomId>> {
        let users = self.users.read().await;
        Ok(users.get(&user).filter(|e| e.live()).map(|e| e.value))
    }

    async fn clear_user_room(&self, user: UserId) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        users.remove(&user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::uid;

    fn room() -> RoomState {
        let mut room = RoomState::create("ABCDEF".into(), uid(1), "u1".into(), 0);
        room.add_member(uid(2), "u2".into()).unwrap();
        room
    }

    #[tokio::test]
    async fn save_establishes_all_three_indexes() {
        let store = MemoryStore::new();
        let room = room();
        store.save(&room).await.unwrap();
        assert!(store.room_by_id(room.room_id).await.unwrap().is_some());
        assert!(store.room_by_code("ABCDEF").await.unwrap().is_some());
        assert_eq!(store.user_room(uid(1)).await.unwrap(), Some(room.room_id));
        assert_eq!(store.user_room(uid(2)).await.unwrap(), Some(room.room_id));
    }

    #[tokio::test]
    async fn delete_removes_all_three_indexes() {
        let store = MemoryStore::new();
        let room = room();
        store.save(&room).await.unwrap();
        store.delete(&room).await.unwrap();
        assert!(store.room_by_id(room.room_id).await.unwrap().is_none());
        assert!(store.room_by_code("ABCDEF").await.unwrap().is_none());
        assert_eq!(store.user_room(uid(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reads_return_deep_copies() {
        let store = MemoryStore::new();
        let room = room();
        store.save(&room).await.unwrap();
        let mut first = store.room_by_id(room.room_id).await.unwrap().unwrap();
        first.players.clear();
        let second = store.room_by_id(room.room_id).await.unwrap().unwrap();
        assert_eq!(second.players.len(), 2);
    }

    #[tokio::test]
    async fn entries_expire_after_the_ttl() {
        let store = MemoryStore::with_ttl(Duration::from_millis(0));
        let room = room();
        store.save(&room).await.unwrap();
        assert!(store.room_by_id(room.room_id).await.unwrap().is_none());
        assert!(store.room_by_code("ABCDEF").await.unwrap().is_none());
        assert_eq!(store.user_room(uid(1)).await.unwrap(), None);
    }
}
