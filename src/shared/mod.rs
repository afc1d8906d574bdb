//! Shared state and messaging between frame producers and readers
//!
//! The engine itself does no locking. When a session is fed from one thread
//! and queried from another, the whole [`SessionState`] sits behind a single
//! `parking_lot::RwLock`; every operation is short, so nothing finer-grained
//! is needed.

pub mod messages;
pub mod state;

pub use messages::SessionMessage;
pub use state::{RuntimeState, SessionState};

use parking_lot::RwLock;
use std::sync::Arc;

use crate::consensus::ConsensusConfig;

/// Session state shared across threads
pub type SharedSessionState = Arc<RwLock<SessionState>>;

/// Create a new shared session state
pub fn shared_state(config: ConsensusConfig) -> SharedSessionState {
    Arc::new(RwLock::new(SessionState::new(config)))
}
