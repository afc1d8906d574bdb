//! Shared session state between the ingestion worker and readers

use crate::capture::FrameResult;
use crate::consensus::{ConsensusConfig, ConsensusEngine};

/// Central shared state of one scanning session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Consensus table
    pub engine: ConsensusEngine,
    /// Runtime counters (not persisted)
    pub runtime: RuntimeState,
}

impl SessionState {
    /// Create a new session state with the given engine configuration
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            engine: ConsensusEngine::new(config),
            runtime: RuntimeState::default(),
        }
    }

    /// Feed one frame into the engine and update counters
    pub fn ingest_frame(&mut self, frame: FrameResult) {
        self.runtime.frames_ingested += 1;
        self.runtime.boxes_ingested += frame.boxes.len() as u64;
        self.runtime.last_frame_timestamp = Some(
            self.runtime
                .last_frame_timestamp
                .map_or(frame.timestamp, |ts| ts.max(frame.timestamp)),
        );
        self.engine.add_full_scan_result(frame);
    }

    /// Feed one reading map into the engine and update counters
    pub fn ingest_readings(&mut self, values: &[(String, String)], timestamp: u64) {
        self.runtime.readings_ingested += values.len() as u64;
        self.engine
            .add_scan_result_at(values.iter().map(|(k, v)| (k, v)), timestamp);
    }

    /// Drop all engine history and counters
    pub fn reset(&mut self) {
        self.engine.clear_all_history();
        self.runtime = RuntimeState::default();
    }
}

/// Runtime counters for a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeState {
    /// Frame results received
    pub frames_ingested: u64,
    /// Field boxes received across all frames
    pub boxes_ingested: u64,
    /// Legacy readings received
    pub readings_ingested: u64,
    /// Latest frame timestamp seen
    pub last_frame_timestamp: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FieldBox, FieldKind};

    #[test]
    fn test_ingest_updates_counters() {
        let mut state = SessionState::default();
        state.ingest_frame(FrameResult::new(
            200,
            vec![FieldBox::text("p1", "12,3"), FieldBox::checkbox("c1", true)],
        ));
        state.ingest_frame(FrameResult::new(100, vec![FieldBox::text("p1", "12,3")]));
        state.ingest_readings(&[("p2".to_string(), "4,5".to_string())], 300);

        assert_eq!(state.runtime.frames_ingested, 2);
        assert_eq!(state.runtime.boxes_ingested, 3);
        assert_eq!(state.runtime.readings_ingested, 1);
        assert_eq!(state.runtime.last_frame_timestamp, Some(200));
        assert_eq!(state.engine.get_best("p1", FieldKind::Value).as_deref(), Some("12,3"));
        assert_eq!(state.engine.get_filtered_value("p2").as_deref(), Some("4,5"));
    }

    #[test]
    fn test_reset() {
        let mut state = SessionState::default();
        state.ingest_frame(FrameResult::new(0, vec![FieldBox::text("p1", "12,3")]));
        state.reset();

        assert_eq!(state.engine.field_count(), 0);
        assert_eq!(state.runtime, RuntimeState::default());
    }
}
