pub mod telegram_user;
