// LogWire - core/mod.rs
//
// Core logic layer: levels, category filters, handlers, sinks and the
// configuration wire schema.
// Dependencies: standard library, serde, chrono.
// Must NOT depend on: app, platform, or any process-wide state.

pub mod filter;
pub mod handler;
pub mod model;
pub mod protocol;
pub mod sink;
