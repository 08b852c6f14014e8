/// Session token validation for the external identity provider
///
/// The provider signs session tokens with RS256. Services only hold the
/// public key; [`SessionSigner`] exists for tooling and tests that need to
/// mint tokens against a known private key.
///
/// ## Security Design
///
/// - **RS256 ONLY**: no symmetric algorithms, no algorithm negotiation
/// - **Explicit keys**: verifiers are values passed to whoever needs them,
///   there is no process-global key slot
///
/// ```rust,ignore
/// use crypto_core::SessionVerifier;
///
/// let pem = std::env::var("SESSION_PUBLIC_KEY_PEM")?;
/// let verifier = SessionVerifier::from_rsa_pem(&pem)?;
/// let claims = verifier.verify(token)?;
/// if claims.has_role("admin") { /* ... */ }
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

const SESSION_ALGORITHM: Algorithm = Algorithm::RS256;

/// Custom session claims configured on the provider side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims carried by a provider session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the provider's user id (e.g. `user_2abc...`)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer (provider frontend API URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl SessionClaims {
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: None,
            metadata: SessionMetadata::default(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.metadata.role = Some(role.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Role claim exactly as the provider sent it
    pub fn role(&self) -> Option<&str> {
        self.metadata.role.as_deref()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role() == Some(role)
    }
}

/// Validates session tokens against the provider's public key
#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    issuer: Option<String>,
}

impl fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("key", &"[RSA PUBLIC KEY]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl SessionVerifier {
    /// Build a verifier from an RSA public key in PEM format
    pub fn from_rsa_pem(public_key_pem: &str) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

        Ok(Self { key, issuer: None })
    }

    /// Require the `iss` claim to match
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Validate signature and expiry, then return the claims
    ///
    /// ## Arguments
    ///
    /// * `token` - token string without the "Bearer " prefix
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<SessionClaims>(token, &self.key, &validation)
            .map_err(|e| anyhow!("Session token validation failed: {e}"))?;

        if data.claims.sub.trim().is_empty() {
            return Err(anyhow!("Session token has an empty subject"));
        }

        Ok(data.claims)
    }
}

/// Mints session tokens with an RSA private key
#[derive(Clone)]
pub struct SessionSigner {
    key: EncodingKey,
}

impl SessionSigner {
    pub fn from_rsa_pem(private_key_pem: &str) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

        Ok(Self { key })
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(SESSION_ALGORITHM), claims, &self.key)
            .map_err(|e| anyhow!("Failed to sign session token: {e}"))
    }
}
