//! Domain layer types and invariants.

pub mod accounts;
pub mod credentials;
pub mod entities;
pub mod error;
pub mod preferences;
pub mod types;
