//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no business rules:
//! - Cryptographic utilities (SHA-256, HMAC signatures, Base64)
//! - Password hashing (Argon2id)
//! - Session cookie helpers and client fingerprinting
//! - In-process live event bus

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod events;
pub mod password;
