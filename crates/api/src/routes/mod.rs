pub mod auth;
pub mod call;
pub mod health;
pub mod rtc;
pub mod session;
pub mod transcript;
