pub mod auth;
pub mod company;
pub mod holiday;
pub mod invite;
pub(crate) mod macros;
pub mod rate;
pub mod shift;
pub mod stats;
pub mod time_off;
pub mod user;

// Re-export all models for easy importing
pub use auth::*;
pub use company::*;
pub use holiday::*;
pub use invite::*;
pub use rate::*;
pub use shift::*;
pub use stats::*;
pub use time_off::*;
pub use user::*;
