pub mod telegram_auth;
pub mod time;
pub mod token;
pub mod validation;
