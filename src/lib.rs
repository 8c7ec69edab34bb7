// LogWire - lib.rs
//
// Library entry point. Everything the CLI uses is exposed here so hosts can
// embed the log core directly and integration tests can drive it.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
