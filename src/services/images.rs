//! Image fetching, storage, and signed proxy URLs.
//!
//! Images are fetched from caller-supplied URLs (product databases, menu
//! photos), so the fetch path is hardened: public http(s) hosts only, a
//! short timeout, an `image/*` content type, and a byte cap. Stored files
//! are named by content hash and served back through HMAC-signed URLs so
//! the storage directory never has to be public.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use url::{Host, Url};

use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// A token authorizing one path until `expires`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SignedUrl {
    pub path: String,
    pub expires: i64,
    pub token: String,
}

#[derive(Clone)]
pub struct ImageService {
    storage_dir: PathBuf,
    signing_secret: Vec<u8>,
    max_bytes: usize,
    http: reqwest::Client,
}

impl ImageService {
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        signing_secret: impl AsRef<[u8]>,
        max_bytes: usize,
        fetch_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("brigade-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            storage_dir: storage_dir.into(),
            signing_secret: signing_secret.as_ref().to_vec(),
            max_bytes,
            http,
        })
    }

    /// Downloads an image and stores it under `folder`, returning the
    /// relative storage path. The filename is the SHA-256 of the content,
    /// so re-fetching the same image is idempotent.
    #[instrument(skip(self))]
    pub async fn store_from_url(&self, url: &str, folder: &str) -> Result<String, ServiceError> {
        check_folder(folder)?;
        let url = check_public_http_url(url)?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("Image fetch failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Image fetch returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ServiceError::InvalidInput(format!(
                "URL does not point at an image (content type '{}')",
                content_type
            )));
        }
        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(ServiceError::InvalidInput(format!(
                    "Image exceeds the {} byte limit",
                    self.max_bytes
                )));
            }
        }

        let body = response.bytes().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Image download failed: {}", e))
        })?;
        if body.len() > self.max_bytes {
            return Err(ServiceError::InvalidInput(format!(
                "Image exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let extension = extension_for(&content_type);
        let digest = hex::encode(Sha256::digest(&body));
        let relative = format!("{}/{}.{}", folder, digest, extension);

        let target = self.storage_dir.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ServiceError::InternalError(format!("Image directory creation failed: {}", e))
            })?;
        }
        tokio::fs::write(&target, &body)
            .await
            .map_err(|e| ServiceError::InternalError(format!("Image write failed: {}", e)))?;

        info!("Stored image {} ({} bytes)", relative, body.len());
        Ok(relative)
    }

    /// Reads a stored image for proxying. Path traversal is rejected.
    #[instrument(skip(self))]
    pub async fn open(&self, path: &str) -> Result<(Vec<u8>, String), ServiceError> {
        check_relative_path(path)?;
        let full = self.storage_dir.join(path);
        let body = tokio::fs::read(&full)
            .await
            .map_err(|_| ServiceError::NotFound("Image not found".to_string()))?;
        Ok((body, mime_for(path)))
    }

    /// Deletes a stored image. Missing files are not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        check_relative_path(path)?;
        let full = self.storage_dir.join(path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::InternalError(format!(
                "Image delete failed: {}",
                e
            ))),
        }
    }

    /// Issues a signed URL token for a stored path, valid for `ttl`.
    pub fn sign(&self, path: &str, ttl: Duration) -> Result<SignedUrl, ServiceError> {
        check_relative_path(path)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(SignedUrl {
            path: path.to_string(),
            expires,
            token: self.token_for(path, expires)?,
        })
    }

    /// Verifies a token against a path and expiry timestamp.
    pub fn verify(&self, path: &str, expires: i64, token: &str) -> Result<(), ServiceError> {
        check_relative_path(path)?;
        if expires < Utc::now().timestamp() {
            return Err(ServiceError::Forbidden("Image URL has expired".to_string()));
        }
        let expected = self.token_for(path, expires)?;
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| ServiceError::InternalError(format!("Signing key invalid: {}", e)))?;
        mac.update(expected.as_bytes());
        let mut check = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| ServiceError::InternalError(format!("Signing key invalid: {}", e)))?;
        check.update(token.as_bytes());
        // Compare MACs of the tokens for constant-time equality.
        if mac.finalize().into_bytes() != check.finalize().into_bytes() {
            return Err(ServiceError::Forbidden(
                "Image URL signature is invalid".to_string(),
            ));
        }
        Ok(())
    }

    fn token_for(&self, path: &str, expires: i64) -> Result<String, ServiceError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| ServiceError::InternalError(format!("Signing key invalid: {}", e)))?;
        mac.update(path.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

/// Rejects URLs that could reach internal services: only absolute http(s)
/// URLs to public hosts pass. Hostname-based checks cannot see through
/// DNS, so IP literals are checked directly and obvious internal names are
/// refused.
fn check_public_http_url(raw: &str) -> Result<Url, ServiceError> {
    let url = Url::parse(raw)
        .map_err(|_| ServiceError::InvalidInput("Image URL is not a valid URL".to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ServiceError::InvalidInput(
            "Image URL must use http or https".to_string(),
        ));
    }
    match url.host() {
        Some(Host::Ipv4(ip)) => check_public_ip(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => check_public_ip(IpAddr::V6(ip))?,
        Some(Host::Domain(domain)) => {
            let lower = domain.to_ascii_lowercase();
            if lower == "localhost" || lower.ends_with(".localhost") || lower.ends_with(".local")
                || lower.ends_with(".internal")
            {
                return Err(ServiceError::InvalidInput(
                    "Image URL points at an internal host".to_string(),
                ));
            }
        }
        None => {
            return Err(ServiceError::InvalidInput(
                "Image URL has no host".to_string(),
            ));
        }
    }
    Ok(url)
}

fn check_public_ip(ip: IpAddr) -> Result<(), ServiceError> {
    let private = match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    };
    if private {
        warn!("Rejected image fetch from non-public address {}", ip);
        return Err(ServiceError::InvalidInput(
            "Image URL points at an internal host".to_string(),
        ));
    }
    Ok(())
}

fn check_folder(folder: &str) -> Result<(), ServiceError> {
    if folder.is_empty()
        || !folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ServiceError::InvalidInput(
            "Image folder name is invalid".to_string(),
        ));
    }
    Ok(())
}

fn check_relative_path(path: &str) -> Result<(), ServiceError> {
    let ok = !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && Path::new(path)
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if !ok {
        return Err(ServiceError::InvalidInput(
            "Image path is invalid".to_string(),
        ));
    }
    Ok(())
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
    {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "jpg",
    }
}

fn mime_for(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match extension {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ImageService {
        ImageService::new(
            std::env::temp_dir().join("brigade-image-tests"),
            b"test-signing-secret",
            2_000_000,
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn public_url_guard() {
        assert!(check_public_http_url("https://example.com/a.jpg").is_ok());
        assert!(check_public_http_url("http://93.184.216.34/a.jpg").is_ok());

        assert!(check_public_http_url("ftp://example.com/a.jpg").is_err());
        assert!(check_public_http_url("https://localhost/a.jpg").is_err());
        assert!(check_public_http_url("https://printer.local/a.jpg").is_err());
        assert!(check_public_http_url("http://127.0.0.1/a.jpg").is_err());
        assert!(check_public_http_url("http://10.0.0.5/a.jpg").is_err());
        assert!(check_public_http_url("http://192.168.1.1/a.jpg").is_err());
        assert!(check_public_http_url("http://169.254.169.254/meta").is_err());
        assert!(check_public_http_url("http://[::1]/a.jpg").is_err());
        assert!(check_public_http_url("not a url").is_err());
    }

    #[test]
    fn path_guard_rejects_traversal() {
        assert!(check_relative_path("menus/abc123.jpg").is_ok());
        assert!(check_relative_path("../secrets").is_err());
        assert!(check_relative_path("menus/../../etc/passwd").is_err());
        assert!(check_relative_path("/etc/passwd").is_err());
        assert!(check_relative_path("").is_err());
    }

    #[test]
    fn signed_url_round_trip() {
        let images = service();
        let signed = images.sign("menus/abc.jpg", Duration::from_secs(60)).unwrap();
        assert!(images
            .verify(&signed.path, signed.expires, &signed.token)
            .is_ok());

        // Wrong path, wrong expiry, and tampered token all fail.
        assert!(images
            .verify("menus/other.jpg", signed.expires, &signed.token)
            .is_err());
        assert!(images
            .verify(&signed.path, signed.expires + 1, &signed.token)
            .is_err());
        let mut tampered = signed.token.clone();
        tampered.push('x');
        assert!(images
            .verify(&signed.path, signed.expires, &tampered)
            .is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let images = service();
        let signed = images.sign("menus/abc.jpg", Duration::from_secs(60)).unwrap();
        let past = Utc::now().timestamp() - 10;
        let token = images.token_for(&signed.path, past).unwrap();
        assert!(images.verify(&signed.path, past, &token).is_err());
    }

    #[test]
    fn extensions_follow_content_type() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg; charset=binary"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
    }

    #[tokio::test]
    async fn open_and_delete_stored_files() {
        let dir = tempfile::tempdir().unwrap();
        let images = ImageService::new(
            dir.path(),
            b"test-signing-secret",
            2_000_000,
            Duration::from_secs(10),
        )
        .unwrap();

        tokio::fs::create_dir_all(dir.path().join("menus")).await.unwrap();
        tokio::fs::write(dir.path().join("menus/abc.png"), b"png bytes")
            .await
            .unwrap();

        let (body, mime) = images.open("menus/abc.png").await.unwrap();
        assert_eq!(body, b"png bytes");
        assert_eq!(mime, "image/png");

        images.delete("menus/abc.png").await.unwrap();
        assert!(images.open("menus/abc.png").await.is_err());
        // Deleting again is a no-op.
        images.delete("menus/abc.png").await.unwrap();
    }
}
