//! quotecache library
//!
//! Equity and precious metal quotes served over HTTP, with a TTL cache keeping
//! upstream providers from being asked the same question twice. This module
//! exposes every component for the binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod db;
pub mod logging;
pub mod lookup;
pub mod pipeline;
pub mod server;
