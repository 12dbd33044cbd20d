//! Commands, queries and the repository seam they run against.

pub mod command;
pub mod commands;
pub mod context;
pub mod error;
pub mod queries;
pub mod query;
pub mod repos;
