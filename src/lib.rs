//! Browser-accessible controller for serial robot arms.
//!
//! The heart of the crate is [`link::SerialLink`]: it owns the single
//! serial connection, keeps a rolling buffer of the unframed lines the
//! robot emits, correlates replies back to commands by timestamp, and
//! heals dropped connections in the background. The [`server`] module
//! exposes that core over a small HTTP API.

pub mod calibration;
pub mod config;
pub mod link;
pub mod server;
