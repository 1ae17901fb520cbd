//! Bearer token verification.
//!
//! Tokens are JWTs issued by the identity provider; the `sub` claim is the
//! user identifier that keys every document this service touches.

use crate::config::{IdentityConfig, IdentityKey};
use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token rejected: {0}")]
    Rejected(String),

    #[error("Token has no subject")]
    MissingSubject,
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => VerifyError::Malformed(err.to_string()),
            _ => VerifyError::Rejected(err.to_string()),
        }
    }
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    sub: String,
}

/// Verifies identity-provider JWTs against a fixed key.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn from_config(config: &IdentityConfig) -> Result<Self, anyhow::Error> {
        let verifier = match &config.key {
            IdentityKey::PublicKeyPath(path) => {
                let public_key_pem = fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read public key from {}: {}", path, e)
                })?;
                Self::from_rsa_pem(public_key_pem.as_bytes())?
            }
            IdentityKey::SharedSecret(secret) => {
                Self::from_secret(secret.expose_secret().as_bytes())
            }
        };

        let verifier = verifier.with_claims(config.issuer.as_deref(), config.audience.as_deref());
        tracing::info!(
            issuer = ?config.issuer,
            audience = ?config.audience,
            "Identity verifier initialized"
        );
        Ok(verifier)
    }

    /// RS256 verification with a PEM-encoded public key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, anyhow::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| anyhow::anyhow!("Failed to parse public key: {}", e))?;
        Ok(Self::new(decoding_key, Algorithm::RS256))
    }

    /// HS256 verification with a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    fn new(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        Self {
            decoding_key,
            validation,
        }
    }

    /// Require `iss` and/or `aud` to match when given.
    pub fn with_claims(mut self, issuer: Option<&str>, audience: Option<&str>) -> Self {
        if let Some(issuer) = issuer {
            self.validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = audience {
            self.validation.set_audience(&[audience]);
            self.validation.validate_aud = true;
        }
        self
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let data = decode::<IdTokenClaims>(token, &self.decoding_key, &self.validation)?;

        if data.claims.sub.is_empty() {
            return Err(VerifyError::MissingSubject);
        }

        Ok(VerifiedIdentity {
            user_id: data.claims.sub,
        })
    }
}
