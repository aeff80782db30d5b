use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::client::BackendClient;
use crate::events::RoomEvent;

/// Single-fire latch for session finalization, scoped to this worker
/// process. The disconnect handler, the explicit end-of-call path and the
/// shutdown hook all race through here; only the first caller proceeds.
///
/// This guards local trigger duplication only. Another process can still
/// attempt the same finalize; the store's unique index on the session id
/// is the guarantee there.
#[derive(Default)]
pub struct FinalizeGuard {
    fired: AtomicBool,
}

impl FinalizeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once.
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Per-call worker: consumes room events, streams transcripts to the
/// backend, and finalizes the session on the first termination trigger.
pub struct CallWorker {
    client: Arc<BackendClient>,
    guard: Arc<FinalizeGuard>,
    room_id: String,
    participant_id: String,
    agent_identity: String,
    phone_number: Option<String>,
    /// Outer deadline for a shutdown-triggered finalize; past it the
    /// finalize is abandoned mid-flight.
    shutdown_deadline: Duration,
}

impl CallWorker {
    pub fn new(
        client: Arc<BackendClient>,
        room_id: String,
        participant_id: String,
        agent_identity: String,
        phone_number: Option<String>,
        shutdown_deadline: Duration,
    ) -> Self {
        Self {
            client,
            guard: Arc::new(FinalizeGuard::new()),
            room_id,
            participant_id,
            agent_identity,
            phone_number,
            shutdown_deadline,
        }
    }

    pub fn guard(&self) -> Arc<FinalizeGuard> {
        Arc::clone(&self.guard)
    }

    pub async fn handle(&self, event: RoomEvent) {
        match event {
            RoomEvent::FinalTranscript { speaker, text } => {
                // Fire-and-forget: transcript sends carry no ordering
                // invariant and must not block the event loop.
                let client = Arc::clone(&self.client);
                let room_id = self.room_id.clone();
                tokio::spawn(async move {
                    client.send_transcript(&room_id, &speaker, &text).await;
                });
            }
            RoomEvent::ParticipantDisconnected { identity } => {
                if identity == self.agent_identity {
                    return;
                }
                info!(%identity, "Participant left, finalizing");
                self.try_finalize().await;
            }
            RoomEvent::Shutdown => {
                info!("Shutdown requested");
                let finalize = self.try_finalize();
                if tokio::time::timeout(self.shutdown_deadline, finalize)
                    .await
                    .is_err()
                {
                    warn!(
                        room_id = %self.room_id,
                        "Shutdown deadline exceeded, abandoning finalize"
                    );
                }
            }
        }
    }

    /// Latched entry point shared by every termination trigger.
    pub async fn try_finalize(&self) {
        if !self.guard.fire() {
            return;
        }
        info!(room_id = %self.room_id, "Finalize latch acquired");
        self.client
            .finalize(
                &self.room_id,
                &self.participant_id,
                self.phone_number.as_deref(),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_fires_exactly_once() {
        let guard = FinalizeGuard::new();
        assert!(!guard.has_fired());
        assert!(guard.fire());
        assert!(!guard.fire());
        assert!(guard.has_fired());
    }

    #[tokio::test]
    async fn guard_fires_once_under_contention() {
        let guard = Arc::new(FinalizeGuard::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let guard = Arc::clone(&guard);
            handles.push(tokio::spawn(async move { guard.fire() }));
        }

        let mut fired = 0;
        for h in handles {
            if h.await.unwrap() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[tokio::test]
    async fn agent_disconnect_does_not_finalize() {
        let worker = CallWorker::new(
            Arc::new(BackendClient::new("http://127.0.0.1:9")),
            "room-user-1".to_string(),
            "1".to_string(),
            "agent".to_string(),
            None,
            Duration::from_secs(1),
        );

        worker
            .handle(RoomEvent::ParticipantDisconnected {
                identity: "agent".to_string(),
            })
            .await;
        assert!(!worker.guard().has_fired());
    }
}
