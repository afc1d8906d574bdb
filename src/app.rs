//! Scan Session Coordinator
//!
//! Runs the consensus engine behind a shared lock with a background worker
//! that applies frames as the producer delivers them. Readers query the shared
//! state directly and always see the state after some whole message.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::FrameResult;
use crate::consensus::{ConsensusConfig, ConsensusEngine};
use crate::shared::{shared_state, SessionMessage, SharedSessionState};

/// Cloneable handle used by frame producers
#[derive(Debug, Clone)]
pub struct FrameSender {
    sender: Sender<SessionMessage>,
}

impl FrameSender {
    /// Queue one frame. Returns false once the session has shut down.
    pub fn send_frame(&self, frame: FrameResult) -> bool {
        self.sender.send(SessionMessage::Frame(frame)).is_ok()
    }

    /// Queue one reading map. Returns false once the session has shut down.
    pub fn send_readings(&self, values: Vec<(String, String)>, timestamp: u64) -> bool {
        self.sender
            .send(SessionMessage::Readings { values, timestamp })
            .is_ok()
    }
}

/// One scanning session
pub struct ScanSession {
    /// Engine and counters shared with the worker
    shared_state: SharedSessionState,
    /// Channel to the ingestion worker
    to_worker: Sender<SessionMessage>,
    /// Handle to the ingestion worker thread
    worker_handle: Option<JoinHandle<()>>,
}

impl ScanSession {
    /// Start a session and its ingestion worker
    pub fn new(config: ConsensusConfig) -> Result<Self> {
        let shared_state = shared_state(config);
        let (to_worker, worker_rx) = unbounded();

        let worker_state = shared_state.clone();
        let handle = std::thread::Builder::new()
            .name("consensus-ingest".to_string())
            .spawn(move || run_worker(worker_state, worker_rx))
            .context("Failed to spawn ingestion worker")?;

        info!("Scan session started");

        Ok(Self {
            shared_state,
            to_worker,
            worker_handle: Some(handle),
        })
    }

    /// Handle for producers on other threads
    pub fn frame_sender(&self) -> FrameSender {
        FrameSender {
            sender: self.to_worker.clone(),
        }
    }

    /// Queue one frame
    pub fn submit_frame(&self, frame: FrameResult) {
        self.send(SessionMessage::Frame(frame));
    }

    /// Queue one reading map
    pub fn submit_readings(&self, values: Vec<(String, String)>, timestamp: u64) {
        self.send(SessionMessage::Readings { values, timestamp });
    }

    /// Queue removal of one field
    pub fn clear_field(&self, field_id: impl Into<String>) {
        self.send(SessionMessage::ClearField(field_id.into()));
    }

    /// Queue removal of every field
    pub fn clear_all(&self) {
        self.send(SessionMessage::ClearAll);
    }

    /// Block until every message queued so far has been applied
    pub fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        self.to_worker
            .send(SessionMessage::Flush(ack_tx))
            .context("Ingestion worker is not running")?;
        ack_rx.recv().context("Ingestion worker stopped before flushing")?;
        Ok(())
    }

    /// Run a query against the current engine state
    pub fn read<R>(&self, f: impl FnOnce(&ConsensusEngine) -> R) -> R {
        f(&self.shared_state.read().engine)
    }

    /// Get the shared session state
    pub fn state(&self) -> SharedSessionState {
        self.shared_state.clone()
    }

    /// Check if the worker is still running
    pub fn is_running(&self) -> bool {
        self.worker_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn send(&self, message: SessionMessage) {
        if self.to_worker.send(message).is_err() {
            warn!("Ingestion worker is gone, message dropped");
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // Signal worker to stop
        let _ = self.to_worker.send(SessionMessage::Shutdown);

        // Wait for worker thread to finish
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
        info!("Scan session stopped");
    }
}

fn run_worker(state: SharedSessionState, rx: Receiver<SessionMessage>) {
    debug!("Ingestion worker starting...");

    for message in rx.iter() {
        match message {
            SessionMessage::Frame(frame) => state.write().ingest_frame(frame),
            SessionMessage::Readings { values, timestamp } => {
                state.write().ingest_readings(&values, timestamp)
            }
            SessionMessage::ClearField(field_id) => {
                state.write().engine.clear_field_history(&field_id)
            }
            SessionMessage::ClearAll => state.write().reset(),
            SessionMessage::Flush(ack) => {
                let _ = ack.send(());
            }
            SessionMessage::Shutdown => break,
        }
    }

    debug!("Ingestion worker exiting...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FieldBox, FieldKind};

    #[test]
    fn test_session_ingests_and_flushes() {
        let session = ScanSession::new(ConsensusConfig::default()).unwrap();
        assert!(session.is_running());

        for ts in [0, 2000, 4000] {
            session.submit_frame(FrameResult::new(ts, vec![FieldBox::text("p1", "12,3")]));
        }
        session.flush().unwrap();

        let best = session.read(|engine| engine.get_best_value("p1", FieldKind::Value));
        assert_eq!(best.value.as_deref(), Some("12,3"));
        assert_eq!(best.total_scans, 3);
        assert_eq!(session.state().read().runtime.frames_ingested, 3);
    }

    #[test]
    fn test_producer_on_other_thread() {
        let session = ScanSession::new(ConsensusConfig::default()).unwrap();
        let sender = session.frame_sender();

        let producer = std::thread::spawn(move || {
            for i in 0..10u64 {
                let frame = FrameResult::new(
                    i * 100,
                    vec![FieldBox::scrollbar("s1", ["v", "1,0", "2,0", "bar"])],
                );
                assert!(sender.send_frame(frame));
            }
            assert!(sender.send_readings(vec![("p2".to_string(), "true".to_string())], 5000));
        });
        producer.join().unwrap();
        session.flush().unwrap();

        session.read(|engine| {
            let best = engine.get_best_value("s1", FieldKind::Scrollbar);
            assert_eq!(best.value.as_deref(), Some("1,0:2,0"));
            assert_eq!(best.total_scans, 10);
            assert_eq!(engine.get_filtered_value("p2").as_deref(), Some("true"));
        });
    }

    #[test]
    fn test_clear_through_session() {
        let session = ScanSession::new(ConsensusConfig::default()).unwrap();
        session.submit_frame(FrameResult::new(
            0,
            vec![FieldBox::text("p1", "1,5"), FieldBox::text("p2", "2,5")],
        ));
        session.clear_field("p1");
        session.flush().unwrap();
        assert!(!session.read(|e| e.is_known("p1")));
        assert!(session.read(|e| e.is_known("p2")));

        session.clear_all();
        session.flush().unwrap();
        assert_eq!(session.read(|e| e.field_count()), 0);
        assert_eq!(session.state().read().runtime.frames_ingested, 0);
    }
}
