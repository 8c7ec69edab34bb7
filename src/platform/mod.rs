// LogWire - platform/mod.rs
//
// Platform abstraction layer: output transports and config file loading.
// Dependencies: core (stream trait, config types), directories crate.
// Must NOT depend on: app.

pub mod config;
pub mod stream;
