//! Signed, time-limited bearer tokens.
//!
//! Tokens use the JWT compact form so any JWT library can read them:
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(HMAC-SHA256(header.claims))
//! ```
//!
//! Only `HS256` is issued or accepted.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::model::User;

const ALGORITHM: &str = "HS256";

/// What a token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch. The token is invalid from this instant on.
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Issues and verifies tokens with one shared secret.
pub struct TokenSigner {
    key: Vec<u8>,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: std::time::Duration) -> Self {
        Self {
            key: secret.to_vec(),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issues a token as if the clock read `now`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        let header = Header { alg: ALGORITHM.to_owned(), typ: "JWT".to_owned() };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?),
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Checks signature, algorithm, and expiry as if the clock read `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };

        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(invalid());
        }
        let claims: Claims = decode_segment(payload)?;
        if now.timestamp() >= claims.exp {
            return Err(Error::unauthorized("Token expired"));
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<Hmac<Sha256>> {
        <Hmac<Sha256>>::new_from_slice(&self.key)
            .map_err(|e| Error::Config(format!("unusable signing key: {e}")))
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| invalid())?;
    serde_json::from_slice(&bytes).map_err(|_| invalid())
}

fn invalid() -> Error {
    Error::unauthorized("Invalid token")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Duration as TimeDelta;

    use super::*;

    fn user() -> User {
        User {
            id: "u-1".into(),
            username: "user1".into(),
            email: "user1@example.com".into(),
            password_hash: String::new(),
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret", Duration::from_secs(3600))
    }

    fn is_unauthorized(result: Result<Claims>, message: &str) -> bool {
        matches!(result, Err(Error::Unauthorized(m)) if m == message)
    }

    #[test]
    fn token_carries_identity_and_one_hour_expiry() {
        let now = Utc::now();
        let token = signer().issue_at(&user(), now).unwrap();
        let claims = signer().verify_at(&token, now).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "user1");
        assert_eq!(claims.email, "user1@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn rejected_at_and_after_expiry() {
        let issued = Utc::now();
        let token = signer().issue_at(&user(), issued).unwrap();

        assert!(signer().verify_at(&token, issued + TimeDelta::seconds(3599)).is_ok());
        assert!(is_unauthorized(
            signer().verify_at(&token, issued + TimeDelta::seconds(3600)),
            "Token expired",
        ));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = signer().issue(&user()).unwrap();
        let other = TokenSigner::new(b"another-secret", Duration::from_secs(3600));
        assert!(is_unauthorized(other.verify(&token), "Invalid token"));
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let token = signer().issue(&user()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            br#"{"sub":"u-2","username":"admin","email":"a@b","iat":0,"exp":99999999999}"#,
        );
        parts[1] = &forged;
        assert!(is_unauthorized(signer().verify(&parts.join(".")), "Invalid token"));
    }

    #[test]
    fn garbage_is_rejected() {
        for token in ["", "abc", "a.b", "a.b.c", "a.b.c.d"] {
            assert!(is_unauthorized(signer().verify(token), "Invalid token"), "{token:?}");
        }
    }
}
