use super::RoomId;
use super::RoomState;
use super::RoomStore;
use redis::AsyncCommands;
use slap_core::ROOM_TTL_SECS;
use slap_engine::UserId;

fn room_key(id: RoomId) -> String {
    format!("room:{}", id)
}
fn code_key(code: &str) -> String {
    format!("roomcode:{}", code)
}
fn user_key(user: UserId) -> String {
    format!("userroom:{}", user)
}

/// Redis-backed room store for multi-process fan-in. Rooms serialize as
/// JSON; every save refreshes the TTL on all three indexes atomically.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn open(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }
    async fn conn(&self) -> anyhow::Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait::async_trait]
impl RoomStore for RedisStore {
    async fn room_by_id(&self, id: RoomId) -> anyhow::Result<Option<RoomState>> {
        let mut conn = self.conn().await?;
        let payload: Option<String> = conn.get(room_key(id)).await?;
        Ok(match payload {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }

    async fn room_by_code(&self, code: &str) -> anyhow::Result<Option<RoomState>> {
        let mut conn = self.conn().await?;
        let id: Option<String> = conn.get(code_key(code)).await?;
        match id {
            Some(raw) => self.room_by_id(raw.parse::<uuid::Uuid>()?.into()).await,
            None => Ok(None),
        }
    }

    async fn save(&self, room: &RoomState) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_string(room)?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.set_ex(room_key(room.room_id), payload, ROOM_TTL_SECS);
        pipe.set_ex(
            code_key(&room.room_code),
            room.room_id.to_string(),
            ROOM_TTL_SECS,
        );
        for member in &room.players {
            pipe.set_ex(
                user_key(member.user_id),
                room.room_id.to_string(),
                ROOM_TTL_SECS,
            );
        }
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, room: &RoomState) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(room_key(room.room_id));
        pipe.del(code_key(&room.room_code));
        for member in &room.players {
            pipe.del(user_key(member.user_id));
        }
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn set_user_room(&self, user: UserId, room: RoomId) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(user_key(user), room.to_string(), ROOM_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn user_room(&self, user: UserId) -> anyhow::Result<Option<RoomId>> {
        let mut conn = self.conn().await?;
        let id: Option<String> = conn.get(user_key(user)).await?;
        Ok(match id {
            Some(raw) => Some(raw.parse::<uuid::Uuid>()?.into()),
            None => None,
        })
    }

    async fn clear_user_room(&self, user: UserId) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(user_key(user)).await?;
        Ok(())
    }
}
