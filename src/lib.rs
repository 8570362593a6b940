//! Cache-aside data access for the menu backend.
//!
//! Storage (Postgres) stays the source of truth; a key-value cache in front of
//! it serves repeated reads and is kept coherent by the orchestrators in
//! [`application`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
mod util;
