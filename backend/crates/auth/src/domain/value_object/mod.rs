//! Value Object Module

pub mod email;
pub mod totp_secret;
pub mod user_password;
pub mod user_status;
