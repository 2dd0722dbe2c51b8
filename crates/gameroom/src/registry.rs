use super::RoomId;
use super::ServerMessage;
use slap_core::ID;
use slap_engine::UserId;
use std::collections::HashMap;
use std::collections::HashSet;
use tokio::sync::mpsc::UnboundedSender;

/// Marker for transport connection ids.
pub struct Connection;
/// One websocket session. A user may hold several at once.
pub type SocketId = ID<Connection>;

struct Socket {
    user_id: Option<UserId>,
    room_id: Option<RoomId>,
    tx: UnboundedSender<ServerMessage>,
}

/// Identity plumbing between transport connections and game identity.
/// Pure in-memory maps, not durable; a player counts as connected while
/// they hold at least one live socket.
#[derive(Default)]
pub struct Registry {
    sockets: HashMap<SocketId, Socket>,
    users: HashMap<UserId, HashSet<SocketId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh, not-yet-identified connection.
    pub fn register(&mut self, tx: UnboundedSender<ServerMessage>) -> SocketId {
        let socket = SocketId::default();
        self.sockets.insert(
            socket,
            Socket {
                user_id: None,
                room_id: None,
                tx,
            },
        );
        socket
    }

    /// Binds a connection to a user and room after create/join/reconnect.
    pub fn bind(&mut self, socket: SocketId, user: UserId, room: RoomId) {
        if let Some(entry) = self.sockets.get_mut(&socket) {
            entry.user_id = Some(user);
            entry.room_id = Some(room);
            self.users.entry(user).or_default().insert(socket);
        }
    }

    /// The user/room pair this socket acts as, if any.
    pub fn binding(&self, socket: SocketId) -> Option<(UserId, RoomId)> {
        let entry = self.sockets.get(&socket)?;
        Some((entry.user_id?, entry.room_id?))
    }

    /// Drops a connection. Returns its binding plus whether it was the
    /// user's last socket (the disconnect-accounting trigger).
    pub fn unregister(&mut self, socket: SocketId) -> Option<(UserId, RoomId, bool)> {
        let entry = self.sockets.remove(&socket)?;
        let (user, room) = (entry.user_id?, entry.room_id?);
        let last = match self.users.get_mut(&user) {
            Some(set) => {
                set.remove(&socket);
                let empty = set.is_empty();
                if empty {
                    self.users.remove(&user);
                }
                empty
            }
            None => true,
        };
        Some((user, room, last))
    }

    /// Detaches every socket a user holds (leave/kick); the connections
    /// stay registered, just identity-less.
    pub fn unbind_user(&mut self, user: &UserId) {
        if let Some(sockets) = self.users.remove(user) {
            for socket in sockets {
                if let Some(entry) = self.sockets.get_mut(&socket) {
                    entry.user_id = None;
                    entry.room_id = None;
                }
            }
        }
    }

    pub fn is_connected(&self, user: &UserId) -> bool {
        self.users.get(user).is_some_and(|s| !s.is_empty())
    }

    pub fn send(&self, socket: SocketId, message: ServerMessage) {
        if let Some(entry) = self.sockets.get(&socket) {
            let _ = entry.tx.send(message);
        }
    }

    /// Fans a message out to every socket the user holds.
    pub fn send_user(&self, user: &UserId, message: &ServerMessage) {
        if let Some(sockets) = self.users.get(user) {
            for socket in sockets {
                if let Some(entry) = self.sockets.get(socket) {
                    let _ = entry.tx.send(message.clone());
                }
            }
        }
    }
}
