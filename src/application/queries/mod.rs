//! Cached read models.

mod information;
mod preferences;
mod saves;
mod subverse;

pub use information::QueryUserInformation;
pub use preferences::QueryUserPreferences;
pub use saves::{QueryUserSaves, is_saved};
pub use subverse::QuerySubverse;
