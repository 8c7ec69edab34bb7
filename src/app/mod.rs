// LogWire - app/mod.rs
//
// Application layer: the process-wide handler registry, factories, remote
// configuration, and the logger front end.
// Dependencies: core, platform (streams and config), util.

pub mod factory;
pub mod logger;
pub mod manager;
pub mod remote;
pub mod setup;
