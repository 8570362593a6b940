//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod items;
pub mod memory;
pub mod redis;
pub mod telemetry;
