// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod change_detector;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod poller;
pub mod schedule;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::engine::{Engine, EngineError, EngineState};
pub use crate::model::{Fact, FactLevel, Report};
pub use crate::notify::{Notifier, NotifierMux};
pub use crate::poller::Collaborators;
