//! Cryptographic Utilities
//!
//! Hashing, keyed signatures and encodings shared by the session layer.

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// 暗号論的乱数バイト列
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// 標準 Base64 エンコード（設定値の受け渡し用）
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// 標準 Base64 デコード
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s.trim())
}

/// HMAC-SHA256 署名を URL-safe Base64（パディングなし）で返す
pub fn sign(key: &[u8], data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// [`sign`] で作った署名を定数時間で検証
pub fn verify_signature(key: &[u8], data: &[u8], signature_b64: &str) -> bool {
    let Ok(signature) = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(&signature).is_ok()
}
