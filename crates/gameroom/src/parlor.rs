use super::ClientCommand;
use super::Job;
use super::RateLimiter;
use super::Registry;
use super::RoomError;
use super::RoomHandle;
use super::RoomId;
use super::RoomState;
use super::RoomStore;
use super::ServerMessage;
use super::SocketId;
use super::Worker;
use super::generate_room_code;
use super::valid_display_name;
use super::valid_room_code;
use slap_core::ROOM_CODE_RETRIES;
use slap_core::now_ms;
use slap_database::Repository;
use slap_database::TransitionKind;
use slap_engine::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// State shared between the parlor and every room worker.
pub(crate) struct Shared {
    pub store: Arc<dyn RoomStore>,
    pub repo: Option<Repository>,
    pub registry: Mutex<Registry>,
    pub limiter: Mutex<RateLimiter>,
}

/// Manages live rooms and their worker tasks, and routes inbound commands.
/// Cross-room work runs in parallel; within a room everything funnels into
/// that room's serialized queue.
pub struct Parlor {
    shared: Arc<Shared>,
    rooms: Arc<Mutex<HashMap<RoomId, RoomHandle>>>,
}

impl Parlor {
    pub fn new(store: Arc<dyn RoomStore>, repo: Option<Repository>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                repo,
                registry: Mutex::new(Registry::new()),
                limiter: Mutex::new(RateLimiter::new()),
            }),
            rooms: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a fresh transport connection and returns its id.
    pub async fn connect(&self, tx: UnboundedSender<ServerMessage>) -> SocketId {
        self.shared.registry.lock().await.register(tx)
    }

    /// Tears a connection down. When it was the user's last socket, the
    /// room's queue gets a disconnect job for connected-flag accounting.
    pub async fn disconnect(&self, socket: SocketId) {
        let departed = {
            let mut registry = self.shared.registry.lock().await;
            registry.unregister(socket)
        };
        self.shared.limiter.lock().await.forget(socket);
        if let Some((user, room, true)) = departed {
            self.enqueue(room, Job::Disconnect { user_id: user }).await;
        }
    }

    /// Routes one schema-valid command. Pings are answered inline; create
    /// and join resolve their room here; everything else requires a bound
    /// socket and goes through the room queue.
    pub async fn dispatch(&self, socket: SocketId, command: ClientCommand) {
        match command {
            ClientCommand::Ping { client_time } => {
                self.send(socket, ServerMessage::pong(now_ms(), client_time))
                    .await;
            }
            ClientCommand::RoomCreate { display_name } => {
                self.create_room(socket, display_name).await;
            }
            ClientCommand::RoomJoin {
                room_code,
                display_name,
                user_id,
            } => {
                self.join_room(socket, room_code, display_name, user_id)
                    .await;
            }
            command => {
                let binding = {
                    let registry = self.shared.registry.lock().await;
                    registry.binding(socket)
                };
                let Some((_, room)) = binding else {
                    self.send(socket, RoomError::RoomNotFound.into_message())
                        .await;
                    return;
                };
                if command.is_rate_limited() {
                    let allowed = {
                        let mut limiter = self.shared.limiter.lock().await;
                        limiter.allow(socket, Instant::now())
                    };
                    if !allowed {
                        self.send(socket, RoomError::RateLimited.into_message())
                            .await;
                        return;
                    }
                }
                self.enqueue(room, Job::Command { socket, command }).await;
            }
        }
    }

    /// Reports a transport-level schema failure on a socket.
    pub async fn reject(&self, socket: SocketId, message: &str) {
        self.send(socket, ServerMessage::error("INTERNAL_ERROR", message))
            .await;
    }

    async fn create_room(&self, socket: SocketId, display_name: String) {
        let name = match valid_display_name(&display_name) {
            Ok(name) => name,
            Err(e) => {
                self.send(socket, e.into_message()).await;
                return;
            }
        };
        let Some(code) = self.fresh_code().await else {
            log::error!("[parlor] room code space exhausted after {} tries", ROOM_CODE_RETRIES);
            self.send(socket, RoomError::Internal.into_message()).await;
            return;
        };
        let user = UserId::default();
        let room = RoomState::create(code, user, name, now_ms());
        if self.shared.store.save(&room).await.is_err() {
            self.send(socket, RoomError::Internal.into_message()).await;
            return;
        }
        let _ = self.shared.store.set_user_room(user, room.room_id).await;
        {
            let mut registry = self.shared.registry.lock().await;
            registry.bind(socket, user, room.room_id);
        }
        self.ensure_worker(room.room_id).await;
        if let Some(repo) = &self.shared.repo {
            repo.upsert_room_metadata(
                room.room_id.uuid(),
                &room.room_code,
                room.status.as_str(),
                room.host_user_id.uuid(),
                room.version as i64,
            )
            .await;
            repo.write_room_snapshot(
                room.room_id.uuid(),
                TransitionKind::Create,
                room.version as i64,
                serde_json::to_value(room.view()).unwrap_or_default(),
            )
            .await;
        }
        log::info!("[parlor] room {} created ({})", room.room_id, room.room_code);
        self.send(socket, ServerMessage::room_state(room.view(), user))
            .await;
    }

    async fn join_room(
        &self,
        socket: SocketId,
        room_code: String,
        display_name: String,
        user_id: Option<UserId>,
    ) {
        let code = match valid_room_code(&room_code) {
            Ok(code) => code,
            Err(e) => {
                self.send(socket, e.into_message()).await;
                return;
            }
        };
        if let Err(e) = valid_display_name(&display_name) {
            self.send(socket, e.into_message()).await;
            return;
        }
        match self.shared.store.room_by_code(&code).await {
            Ok(Some(room)) => {
                // Membership and phase are revalidated under the room queue.
                self.ensure_worker(room.room_id).await;
                self.enqueue(
                    room.room_id,
                    Job::Command {
                        socket,
                        command: ClientCommand::RoomJoin {
                            room_code: code,
                            display_name,
                            user_id,
                        },
                    },
                )
                .await;
            }
            Ok(None) => {
                self.send(socket, RoomError::RoomNotFound.into_message())
                    .await;
            }
            Err(e) => {
                log::error!("[parlor] store lookup failed: {}", e);
                self.send(socket, RoomError::Internal.into_message()).await;
            }
        }
    }

    /// Samples codes until one is free in the store, bounded by the retry
    /// budget.
    async fn fresh_code(&self) -> Option<String> {
        for _ in 0..ROOM_CODE_RETRIES {
            let candidate = {
                let mut rng = rand::rng();
                generate_room_code(&mut rng)
            };
            match self.shared.store.room_by_code(&candidate).await {
                Ok(None) => return Some(candidate),
                Ok(Some(_)) => continue,
                Err(e) => {
                    log::error!("[parlor] store lookup failed: {}", e);
                    return None;
                }
            }
        }
        None
    }

    /// Spawns the room's worker if it is not already running (also how
    /// rooms resurrect from the store after a process restart). A monitor
    /// task reaps the map entry when the worker winds down.
    async fn ensure_worker(&self, room_id: RoomId) {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room_id) {
            return;
        }
        let (handle, done) = Worker::spawn(room_id, self.shared.clone());
        rooms.insert(room_id, handle);
        let map = self.rooms.clone();
        tokio::spawn(async move {
            let _ = done.await;
            map.lock().await.remove(&room_id);
            log::debug!("[parlor] room {} handle cleaned up", room_id);
        });
    }

    async fn enqueue(&self, room: RoomId, job: Job) {
        self.ensure_worker(room).await;
        let rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.get(&room) {
            let _ = handle.tx.send(job);
        }
    }

    async fn send(&self, socket: SocketId, message: ServerMessage) {
        self.shared.registry.lock().await.send(socket, message);
    }
}
