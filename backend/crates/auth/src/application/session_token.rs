//! Session token
//!
//! The cookie value is `<session uuid>.<HMAC-SHA256 signature>`; tokens that
//! fail signature verification are rejected before touching the database.

use platform::crypto::{sign, verify_signature};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// 署名付きトークンを発行
pub fn issue(secret: &[u8], session_id: Uuid) -> String {
    let id = session_id.to_string();
    let signature = sign(secret, id.as_bytes());
    format!("{id}.{signature}")
}

/// 署名を検証してセッション ID を取り出す
pub fn parse(secret: &[u8], token: &str) -> AuthResult<Uuid> {
    let (id, signature) = token.split_once('.').ok_or(AuthError::SessionInvalid)?;
    if !verify_signature(secret, id.as_bytes(), signature) {
        return Err(AuthError::SessionInvalid);
    }
    id.parse().map_err(|_| AuthError::SessionInvalid)
}
