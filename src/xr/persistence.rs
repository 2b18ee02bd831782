use std::time::Duration;

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};

use super::AnchorPersisted;
use crate::measure::AnchorRequestId;

struct PersistRequest {
    request: AnchorRequestId,
    transform: Transform,
}

/// Handle to the platform's anchor-persistence service.
///
/// Requests go to a worker thread; results are picked up on the render
/// thread at the start of a later frame, never concurrently with it.
#[derive(Resource)]
pub struct AnchorPersistence {
    requests: Sender<PersistRequest>,
    results: Receiver<AnchorPersisted>,
}

impl AnchorPersistence {
    /// Start the worker. `latency_ms` simulates the platform round-trip.
    pub fn spawn(latency_ms: u64) -> Self {
        let (requests, request_rx) = crossbeam_channel::unbounded::<PersistRequest>();
        let (result_tx, results) = crossbeam_channel::unbounded();

        let worker = std::thread::Builder::new()
            .name("anchor-persistence".to_string())
            .spawn(move || {
                for PersistRequest { request, transform } in request_rx.iter() {
                    if latency_ms > 0 {
                        std::thread::sleep(Duration::from_millis(latency_ms));
                    }
                    if result_tx.send(AnchorPersisted { request, transform }).is_err() {
                        break;
                    }
                }
            });

        match worker {
            Ok(_) => info!("Anchor persistence service started ({} ms latency)", latency_ms),
            Err(e) => error!("Failed to start anchor persistence worker: {}", e),
        }

        Self { requests, results }
    }

    /// Queue a request. Returns `false` if the worker is gone.
    pub fn request(&self, request: AnchorRequestId, transform: Transform) -> bool {
        self.requests
            .send(PersistRequest { request, transform })
            .is_ok()
    }

    /// Everything that finished since the last call.
    pub fn drain(&self) -> Vec<AnchorPersisted> {
        self.results.try_iter().collect()
    }

    #[cfg(test)]
    fn wait(&self, timeout: Duration) -> Option<AnchorPersisted> {
        self.results.recv_timeout(timeout).ok()
    }
}

/// Forward finished persistence requests into this frame's messages.
pub fn poll_anchor_persistence(
    service: Option<Res<AnchorPersistence>>,
    mut persisted: MessageWriter<AnchorPersisted>,
) {
    let Some(service) = service else {
        return;
    };
    for result in service.drain() {
        trace!("Anchor request {:?} persisted", result.request);
        persisted.write(result);
    }
}
