//! Message types sent from producers to the ingestion worker

use crossbeam_channel::Sender;

use crate::capture::FrameResult;

/// Messages consumed by the session's ingestion worker
#[derive(Debug, Clone)]
pub enum SessionMessage {
    /// One recognized frame
    Frame(FrameResult),
    /// A `{field_id: raw}` reading map taken at `timestamp`
    Readings {
        values: Vec<(String, String)>,
        timestamp: u64,
    },
    /// Forget one field
    ClearField(String),
    /// Forget every field
    ClearAll,
    /// Acknowledge once every earlier message has been applied
    Flush(Sender<()>),
    /// Stop the worker
    Shutdown,
}
