//! readout-consensus - multi-frame OCR consensus for instrument displays
//!
//! A camera repeatedly reads the same instrument screen. Each frame gives one
//! noisy reading per labeled field; this crate accumulates those readings and
//! converges on one trustworthy value per field.

pub mod app;
pub mod capture;
pub mod config;
pub mod consensus;
pub mod shared;
pub mod storage;

pub use app::{FrameSender, ScanSession};
pub use capture::{FieldBox, FieldKind, FieldPayload, FrameResult, Token};
pub use consensus::{BestValue, ConsensusConfig, ConsensusEngine, FieldStats, ObservedValue};
