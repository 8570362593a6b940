//! Use-case orchestration over the cache and the source-of-truth stores.

pub mod authz;
pub mod catalog;
pub mod context;
pub mod entity;
pub mod error;
pub mod inputs;
pub mod repos;
pub mod service;
