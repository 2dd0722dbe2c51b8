use super::SocketId;
use slap_core::RATE_LIMIT_GAP_MS;
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

/// Per-connection input rate cap for gameplay events. Checked before the
/// room lock so floods never reach a worker queue.
#[derive(Default)]
pub struct RateLimiter {
    last: HashMap<SocketId, Instant>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits the event iff the previous gameplay input from this socket
    /// is at least the minimum gap in the past.
    pub fn allow(&mut self, socket: SocketId, now: Instant) -> bool {
        let gap = Duration::from_millis(RATE_LIMIT_GAP_MS);
        match self.last.get(&socket) {
            Some(prev) if now.duration_since(*prev) < gap => false,
            _ => {
                self.last.insert(socket, now);
                true
            }
        }
    }

    pub fn forget(&mut self, socket: SocketId) {
        self.last.remove(&socket);
    }
}
