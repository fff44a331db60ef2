//! SQLite-backed job store.
//!
//! This crate owns the durable record of job identity, state and progress
//! counters. All mutations refresh `updated_at`; terminal transitions are
//! idempotent so duplicate completion signals are harmless; a vanished row
//! is reported to the caller as `Ok(false)` rather than an error, since the
//! pipeline must tolerate a job being deleted mid-flight.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::JobStore;
