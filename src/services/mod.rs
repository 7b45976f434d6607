pub mod auth;
pub mod billing;
pub mod day_type;
pub mod earnings;
pub mod holidays;
pub mod pay_calculator;
pub mod stats;
pub mod time_math;
pub mod user_context;

pub use auth::{AuthService, Claims};
pub use billing::BillingService;
pub use holidays::HolidayRegistry;
pub use user_context::UserContext;
