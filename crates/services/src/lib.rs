pub mod auth;
pub mod dao;
pub mod rtc;
pub mod sentiment;
pub mod session;
