/**
 * Connection Registry
 *
 * Bookkeeping of live connections, grouped by room and then by user:
 *
 * ```text
 * room_id -> user_id -> ConnectionHandle
 * ```
 *
 * # Invariants
 *
 * - At most one handle per `(room_id, user_id)`. Registering a second one
 *   evicts the first and hands it back to the caller.
 * - A room entry exists only while it holds at least one connection. It is
 *   created by `register` and removed by the `deregister` that empties it.
 *
 * # Locking
 *
 * One `RwLock` guards the whole map. `broadcast` only takes the read lock,
 * long enough to clone the room's handles, and writes to peers after
 * releasing it. Concurrent broadcasts therefore do not serialize, and a
 * slow peer never holds the lock.
 */
use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use super::broadcast::{fan_out, BroadcastReport};
use super::connection::{ConnectionHandle, ConnectionId};

type RoomMap = HashMap<String, HashMap<String, ConnectionHandle>>;

pub struct ConnectionRegistry {
    rooms: RwLock<RoomMap>,
    write_timeout: Duration,
}

impl ConnectionRegistry {
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            write_timeout,
        }
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Insert a connection, replacing any connection of the same user in the
    /// same room
    ///
    /// # Returns
    ///
    /// The evicted handle, if one was replaced. The caller is responsible for
    /// closing it.
    pub async fn register(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(handle.room_id().to_string()).or_default();
        let evicted = room.insert(handle.user_id().to_string(), handle.clone());

        match &evicted {
            Some(old) => tracing::info!(
                room_id = handle.room_id(),
                user_id = handle.user_id(),
                evicted = old.id(),
                connection_id = handle.id(),
                "[Registry] connection replaced"
            ),
            None => tracing::info!(
                room_id = handle.room_id(),
                user_id = handle.user_id(),
                connection_id = handle.id(),
                peers = room.len(),
                "[Registry] connection registered"
            ),
        }
        evicted
    }

    /// Remove a user's connection from a room
    ///
    /// Only removes the entry if it still belongs to `connection_id`; a stale
    /// connection that was evicted earlier cannot remove its replacement.
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed.
    pub async fn deregister(&self, room_id: &str, user_id: &str, connection_id: ConnectionId) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return false;
        };

        let owned = room.get(user_id).is_some_and(|h| h.id() == connection_id);
        if !owned {
            return false;
        }
        room.remove(user_id);

        if room.is_empty() {
            rooms.remove(room_id);
            tracing::debug!(room_id, "[Registry] room empty, removed");
        }
        tracing::info!(room_id, user_id, connection_id, "[Registry] connection deregistered");
        true
    }

    /// Clone the handles of a room, leaving out the given users
    pub async fn snapshot(&self, room_id: &str, exclude: &[&str]) -> Vec<ConnectionHandle> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map(|room| {
                room.iter()
                    .filter(|(user_id, _)| !exclude.contains(&user_id.as_str()))
                    .map(|(_, handle)| handle.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Send `payload` to every connection in a room except `exclude`
    ///
    /// Membership is read once, at call time. Write failures are logged and
    /// reported, never returned as errors.
    pub async fn broadcast(&self, room_id: &str, payload: &str, exclude: &[&str]) -> BroadcastReport {
        let peers = self.snapshot(room_id, exclude).await;
        if peers.is_empty() {
            return BroadcastReport::default();
        }
        let report = fan_out(&peers, payload, self.write_timeout).await;
        tracing::debug!(
            room_id,
            delivered = report.delivered,
            failed = report.failed.len(),
            "[Registry] broadcast complete"
        );
        report
    }

    /// Number of rooms with at least one connection
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of connections in a room
    pub async fn connection_count(&self, room_id: &str) -> usize {
        self.rooms.read().await.get(room_id).map_or(0, HashMap::len)
    }

    pub async fn contains(&self, room_id: &str, user_id: &str) -> bool {
        self.rooms
            .read()
            .await
            .get(room_id)
            .is_some_and(|room| room.contains_key(user_id))
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}
