//! TOTP Secret Value Object
//!
//! RFC 6238 codes compatible with common authenticator apps
//! (SHA-1, 6 digits, 30 s step, one step of clock skew).

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AuthError, AuthResult};

const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP: u64 = 30;
const TOTP_ISSUER: &str = "VacXCare";

/// Base32 で保存する TOTP シークレット
#[derive(Debug, Clone)]
pub struct TotpSecret(String);

impl TotpSecret {
    pub fn generate() -> Self {
        Self(Secret::generate_secret().to_encoded().to_string())
    }

    /// DB の値から復元（デコードできなければエラー）
    pub fn from_base32(secret: String) -> AuthResult<Self> {
        Secret::Encoded(secret.clone())
            .to_bytes()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {e}")))?;
        Ok(Self(secret))
    }

    pub fn as_base32(&self) -> &str {
        &self.0
    }

    fn totp(&self, account: &str) -> AuthResult<TOTP> {
        let bytes = Secret::Encoded(self.0.clone())
            .to_bytes()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {e}")))?;
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(TOTP_ISSUER.to_string()),
            account.to_string(),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to create TOTP: {e}")))
    }

    /// 現在のコードと照合（空白は無視）
    pub fn verify(&self, code: &str, account: &str) -> AuthResult<bool> {
        let code: String = code.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(self.totp(account)?.check_current(&code).unwrap_or(false))
    }

    /// QR コード（base64 PNG）
    pub fn qr_code_base64(&self, account: &str) -> AuthResult<String> {
        self.totp(account)?
            .get_qr_base64()
            .map_err(|e| AuthError::Internal(format!("Failed to generate QR code: {e}")))
    }

    pub fn otpauth_url(&self, account: &str) -> AuthResult<String> {
        Ok(self.totp(account)?.get_url())
    }

    #[cfg(test)]
    pub fn current_code(&self, account: &str) -> String {
        self.totp(account)
            .and_then(|t| {
                t.generate_current()
                    .map_err(|e| AuthError::Internal(e.to_string()))
            })
            .unwrap()
    }
}
