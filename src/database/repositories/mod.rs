pub mod company;
pub mod holiday;
pub mod invite;
pub mod rate;
pub mod refresh_token;
pub mod shift;
pub mod time_off;
pub mod user;

// Re-export all repositories for easy importing
pub use company::CompanyRepository;
pub use holiday::HolidayRepository;
pub use invite::InviteRepository;
pub use rate::RateRepository;
pub use refresh_token::{NewRefreshToken, RefreshTokenRepository};
pub use shift::ShiftRepository;
pub use time_off::TimeOffRepository;
pub use user::UserRepository;
