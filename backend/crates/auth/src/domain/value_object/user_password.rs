//! User Password Value Object
//!
//! Domain wrappers over `platform::password`. [`RawPassword`] holds user
//! input (zeroized on drop), [`UserPassword`] the stored Argon2id PHC string.

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// 入力されたパスワード
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// 新規設定用（ポリシー検証あり）
    pub fn new(raw: String) -> AuthResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(|e| AuthError::InvalidInput(policy_message(&e)))
    }

    /// サインイン照合用（正規化のみ）
    pub fn for_sign_in(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }
}

fn policy_message(err: &PasswordPolicyError) -> String {
    match err {
        PasswordPolicyError::TooShort { min, .. } => {
            format!("Password must be at least {min} characters")
        }
        PasswordPolicyError::TooLong { max, .. } => {
            format!("Password must be at most {max} characters")
        }
        PasswordPolicyError::EmptyOrWhitespace => "Password cannot be empty".to_string(),
        PasswordPolicyError::InvalidCharacter => {
            "Password contains invalid characters".to_string()
        }
        PasswordPolicyError::CommonPattern => {
            "Password is too common or follows a predictable pattern".to_string()
        }
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// 保存用のハッシュ済みパスワード
#[derive(Clone)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {e}")))
    }

    pub fn from_phc_string(phc: String) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc)
            .map(Self)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// 定数時間で照合
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPassword([HASH])")
    }
}
