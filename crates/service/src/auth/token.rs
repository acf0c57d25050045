//! Signed access/refresh token pairs.
//!
//! Both tokens are HS256 JWTs carrying the same identity claims plus a `typ`
//! discriminator, so a refresh token is never accepted where an access token
//! is expected. Every token also carries a random `jti`, which keeps two
//! tokens issued for the same account within the same second distinct.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::domain::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in both token kinds. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("expected {expected:?} token, got {found:?}")]
    WrongType { expected: TokenKind, found: TokenKind },
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Issues and verifies token pairs with one symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: secs(access_ttl),
            refresh_ttl: secs(refresh_ttl),
        }
    }

    pub fn issue_pair(&self, account_id: Uuid, email: &str, role: Role) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(Utc::now(), account_id, email, role)
    }

    pub fn issue_pair_at(
        &self,
        now: DateTime<Utc>,
        account_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<TokenPair, TokenError> {
        let iat = now.timestamp();
        let access = TokenClaims {
            sub: account_id,
            email: email.to_string(),
            role,
            typ: TokenKind::Access,
            iat,
            exp: iat.saturating_add(self.access_ttl),
            jti: Uuid::new_v4(),
        };
        let refresh = TokenClaims {
            typ: TokenKind::Refresh,
            exp: iat.saturating_add(self.refresh_ttl),
            jti: Uuid::new_v4(),
            ..access.clone()
        };
        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            access_expires_at: to_datetime(access.exp)?,
            refresh_expires_at: to_datetime(refresh.exp)?,
        })
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Signature first, then expiry: a token is valid only while `now < exp`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below with a strict comparison and no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;
        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }

    pub fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, TokenError> {
        let claims = self.validate(token)?;
        if claims.typ != expected {
            return Err(TokenError::WrongType { expected, found: claims.typ });
        }
        Ok(claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

fn to_datetime(ts: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| TokenError::Encoding(format!("expiry out of range: {ts}")))
}
