pub mod auth;
pub mod billing;
pub mod company;
pub mod earnings;
pub mod holidays;
pub mod invites;
pub mod rates;
pub mod roster;
pub mod shared;
pub mod shifts;
pub mod stats;
pub mod time_off;
