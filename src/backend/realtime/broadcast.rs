/**
 * Room Fan-out
 *
 * Delivers one payload to a snapshot of a room's connections. Peers are
 * written concurrently, each bounded by the same per-write timeout, so one
 * slow or dead peer cannot hold up the others. Failures are logged and
 * counted in the returned report; they never propagate to the caller as
 * errors.
 */
use std::time::Duration;

use futures_util::future::join_all;

use super::connection::ConnectionHandle;

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers the payload was queued for
    pub delivered: usize,
    /// User ids of peers whose write failed
    pub failed: Vec<String>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send `payload` to every handle in `peers`
pub async fn fan_out(peers: &[ConnectionHandle], payload: &str, timeout: Duration) -> BroadcastReport {
    let sends = peers.iter().map(|peer| async move {
        let result = peer.send_text(payload.to_string(), timeout).await;
        (peer, result)
    });

    let mut report = BroadcastReport::default();
    for (peer, result) in join_all(sends).await {
        match result {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!(
                    room_id = peer.room_id(),
                    user_id = peer.user_id(),
                    error = %e,
                    "[Broadcast] transport write failed"
                );
                report.failed.push(peer.user_id().to_string());
            }
        }
    }
    report
}
