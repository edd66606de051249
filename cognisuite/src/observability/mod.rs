//! Observability
//!
//! Subscriber setup for binaries and tests. Library code only emits
//! `tracing` events under `cognisuite::*` targets.

pub mod tracing;
