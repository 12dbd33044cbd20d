//! Quorum: command/query core of a link-aggregation community with a
//! TTL and bucket-invalidated query cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
