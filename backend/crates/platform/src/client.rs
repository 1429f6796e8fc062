//! Client identification utilities
//!
//! Sessions are bound to a fingerprint of the requesting client so that a
//! stolen cookie replayed from another browser is rejected.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, Request, header, request::Parts};
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use std::net::{IpAddr, SocketAddr};

use crate::crypto::sha256;

/// リクエストヘッダーから導出したクライアント指紋
#[derive(Debug, Clone)]
pub struct ClientFingerprint {
    /// User-Agent の SHA-256
    pub hash: [u8; 32],
    /// クライアント IP（X-Forwarded-For 優先）
    pub ip: Option<IpAddr>,
    /// 元の User-Agent（セッション一覧表示用）
    pub user_agent: Option<String>,
}

impl ClientFingerprint {
    pub fn hash_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(String),
}

/// ヘッダーから指紋を抽出（User-Agent 必須）
pub fn extract_fingerprint(
    headers: &HeaderMap,
    client_ip: Option<IpAddr>,
) -> Result<ClientFingerprint, FingerprintError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| FingerprintError::MissingHeader("User-Agent".to_string()))?;

    Ok(ClientFingerprint {
        hash: sha256(user_agent.as_bytes()),
        ip: client_ip,
        user_agent: Some(user_agent.to_string()),
    })
}

/// クライアント IP（X-Forwarded-For の先頭、なければ接続元）
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

/// ミドルウェア用: リクエスト全体から指紋を抽出
///
/// 接続元アドレスは `into_make_service_with_connect_info` が設定した
/// `ConnectInfo<SocketAddr>` 拡張から取得します。
pub fn fingerprint_from_request<B>(req: &Request<B>) -> Result<ClientFingerprint, FingerprintError> {
    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(req.headers(), direct_ip);
    extract_fingerprint(req.headers(), client_ip)
}

/// ハンドラー用の抽出子
///
/// 接続情報が無い場合（テストの `oneshot` など）はヘッダーのみで判定します。
impl<S> FromRequestParts<S> for ClientFingerprint
where
    S: Send + Sync,
{
    type Rejection = FingerprintError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        let client_ip = extract_client_ip(&parts.headers, direct_ip);
        extract_fingerprint(&parts.headers, client_ip)
    }
}

impl IntoResponse for FingerprintError {
    fn into_response(self) -> Response {
        AppError::bad_request(self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_fingerprint() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("VacXCare/Android 3.2"));

        let fp = extract_fingerprint(&headers, None).unwrap();
        assert_eq!(fp.hash, sha256(b"VacXCare/Android 3.2"));
        assert_eq!(fp.user_agent.as_deref(), Some("VacXCare/Android 3.2"));
    }

    #[test]
    fn test_extract_fingerprint_missing_ua() {
        let result = extract_fingerprint(&HeaderMap::new(), None);
        assert!(matches!(result, Err(FingerprintError::MissingHeader(_))));
    }

    #[test]
    fn test_extract_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("192.168.1.1, 10.0.0.1"));
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(
            extract_client_ip(&headers, Some(direct)),
            Some("192.168.1.1".parse().unwrap())
        );
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(direct)), Some(direct));
    }

    #[test]
    fn test_fingerprint_from_request_uses_connect_info() {
        let mut req = Request::builder()
            .header(header::USER_AGENT, "curl/8.5")
            .body(())
            .unwrap();
        let addr: SocketAddr = "10.1.2.3:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let fp = fingerprint_from_request(&req).unwrap();
        assert_eq!(fp.ip_string().as_deref(), Some("10.1.2.3"));
    }
}
