//! Interval consolidation for a scheduling backend: merges each run of
//! touching-or-overlapping events belonging to a member into one
//! consolidated event, leaving isolated events untouched.

pub mod engine;
pub mod model;
pub mod observability;
pub mod store;

pub use engine::{Engine, EngineError};
pub use store::{EventStore, MemStore, ReconcilePlan, StoreError};
