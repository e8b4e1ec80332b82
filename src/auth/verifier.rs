// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the cached key set.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. Header decodes and names the accepted algorithm
//! 2. Key resolves by `kid` and was published for that algorithm
//! 3. Signature verifies
//! 4. `exp`, `iss`, `aud` are present
//! 5. `exp`, `nbf`, `iss`, `aud` hold, then `sub` is present

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::debug;

use super::claims::RawClaims;
use super::error::{UNPARSABLE_TOKEN, UNSUPPORTED_ALGORITHM};
use super::jwks::{HttpKeySource, JwksManager, KeySource};
use super::{AuthError, ClaimSet};

/// Expected values for verified tokens.
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// Expected `iss`
    pub issuer: String,
    /// Audience that `aud` must contain
    pub audience: String,
    /// The only accepted signing algorithm
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds
    pub leeway: u64,
}

impl VerifierSettings {
    /// RS256 with no clock skew tolerance.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm: Algorithm::RS256,
            leeway: 0,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        // `sub` is checked after expiry, when the claim set is built.
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation
    }
}

/// Verifies bearer tokens and produces their claims.
pub struct TokenVerifier<S = HttpKeySource> {
    jwks: JwksManager<S>,
    settings: Arc<VerifierSettings>,
}

impl<S> Clone for TokenVerifier<S> {
    fn clone(&self) -> Self {
        Self {
            jwks: self.jwks.clone(),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S: KeySource> TokenVerifier<S> {
    pub fn new(jwks: JwksManager<S>, settings: VerifierSettings) -> Self {
        Self {
            jwks,
            settings: Arc::new(settings),
        }
    }

    pub fn jwks(&self) -> &JwksManager<S> {
        &self.jwks
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    /// - `InvalidHeader` for an undecodable token or a foreign algorithm
    /// - whatever `JwksManager::resolve` returns
    /// - `InvalidSignature`, `TokenExpired`, `InvalidClaims` from the checks
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidHeader(UNPARSABLE_TOKEN))?;

        if header.alg != self.settings.algorithm {
            debug!(alg = ?header.alg, "Rejecting token signed with foreign algorithm");
            return Err(AuthError::InvalidHeader(UNSUPPORTED_ALGORITHM));
        }

        let key = self.jwks.resolve(header.kid.as_deref()).await?;
        if key.algorithm() != header.alg {
            debug!(
                kid = key.kid(),
                alg = ?header.alg,
                key_alg = ?key.algorithm(),
                "Token algorithm does not match its key"
            );
            return Err(AuthError::InvalidHeader(UNSUPPORTED_ALGORITHM));
        }

        let token_data = decode::<RawClaims>(token, key.decoding_key(), &self.settings.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidSubject
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidClaimFormat(_) => AuthError::InvalidClaims,
                ErrorKind::InvalidAlgorithm => AuthError::InvalidHeader(UNSUPPORTED_ALGORITHM),
                _ => AuthError::InvalidHeader(UNPARSABLE_TOKEN),
            })?;

        ClaimSet::try_from(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::jwk::JwkSet;

    struct EmptySource;

    impl KeySource for EmptySource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Ok(JwkSet { keys: Vec::new() })
        }
    }

    fn verifier() -> TokenVerifier<EmptySource> {
        TokenVerifier::new(
            JwksManager::new(EmptySource),
            VerifierSettings::new("https://tenant.auth0.com/", "casting"),
        )
    }

    fn unsigned_token(header: &str) -> String {
        let claims = r#"{"sub":"auth0|1","iss":"https://tenant.auth0.com/","aud":"casting","exp":9999999999}"#;
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn validation_requires_registered_claims() {
        let validation = VerifierSettings::new("iss", "aud").validation();
        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert_eq!(validation.leeway, 0);
        assert!(validation.required_spec_claims.contains("aud"));
        assert!(validation.required_spec_claims.contains("iss"));
        assert!(validation.required_spec_claims.contains("exp"));
        assert!(validation.validate_nbf);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_header() {
        let err = verifier().verify("not-a-jwt").await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_header");
    }

    #[tokio::test]
    async fn alg_none_is_rejected() {
        let token = unsigned_token(r#"{"alg":"none","typ":"JWT","kid":"k1"}"#);
        let err = verifier().verify(&token).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_header");
    }

    #[tokio::test]
    async fn symmetric_algorithm_is_rejected_before_key_lookup() {
        let verifier = verifier();
        let token = unsigned_token(r#"{"alg":"HS256","typ":"JWT","kid":"k1"}"#);
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidHeader(UNSUPPORTED_ALGORITHM)));
        assert!(!verifier.jwks().is_cached().await);
    }

    #[tokio::test]
    async fn missing_kid_is_invalid_header() {
        let token = unsigned_token(r#"{"alg":"RS256","typ":"JWT"}"#);
        let err = verifier().verify(&token).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_header");
        assert_eq!(err.to_string(), "Authorization malformed.");
    }

    #[tokio::test]
    async fn unknown_kid_is_no_matching_key() {
        let token = unsigned_token(r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#);
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::NoMatchingKey));
    }
}
