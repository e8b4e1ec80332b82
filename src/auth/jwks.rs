// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Cache Policy
//!
//! - The key set is held as an immutable snapshot; a refresh swaps in a new
//!   snapshot, readers never observe a half-updated set
//! - A snapshot older than the TTL is never served
//! - An unknown `kid` triggers at most one refresh before giving up
//! - Concurrent misses share one outstanding fetch
//! - The fetch runs in its own task, so a caller that goes away does not
//!   abort the refresh other callers are waiting on
//!
//! ## Usage
//!
//! Build a `JwksManager` over an `HttpKeySource` in main.rs and hand it to the
//! `AuthGate`. Tests swap in their own `KeySource`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::error::{AuthError, MISSING_KEY_ID};

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default upper bound on a single key set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where signing keys come from.
pub trait KeySource: Send + Sync + 'static {
    /// Fetch the current key set.
    fn fetch(&self) -> impl Future<Output = Result<JwkSet, AuthError>> + Send;
}

/// Key source backed by a well-known JWKS endpoint.
#[derive(Clone)]
pub struct HttpKeySource {
    jwks_url: String,
    client: reqwest::Client,
}

impl HttpKeySource {
    /// Create a source for `jwks_url` whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            jwks_url: jwks_url.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::JwksUnavailable(e.to_string()))
    }
}

/// A public verification key taken from the key set.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    algorithm: Algorithm,
    key: DecodingKey,
}

impl SigningKey {
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Convert a JWK into a signing key.
    fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        let kid = jwk.common.key_id.clone().ok_or("key has no kid")?;

        let (key, algorithm) = match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) => {
                let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                    .map_err(|e| format!("invalid RSA key: {e}"))?;
                let alg = match jwk.common.key_algorithm {
                    Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                    Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                    Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                    Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                    Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                    _ => Algorithm::RS256,
                };
                (key, alg)
            }
            AlgorithmParameters::EllipticCurve(ec) => {
                let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                    .map_err(|e| format!("invalid EC key: {e}"))?;
                let alg = match jwk.common.key_algorithm {
                    Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                    _ => Algorithm::ES256,
                };
                (key, alg)
            }
            _ => return Err("unsupported key type".to_string()),
        };

        Ok(Self {
            kid,
            algorithm,
            key,
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// One fetched generation of keys. Never mutated after construction.
struct KeySet {
    keys: Vec<Arc<SigningKey>>,
    fetched_at: Instant,
}

impl KeySet {
    fn from_jwks(jwks: JwkSet) -> Self {
        let keys = jwks
            .keys
            .iter()
            .filter_map(|jwk| match SigningKey::from_jwk(jwk) {
                Ok(key) => Some(Arc::new(key)),
                Err(reason) => {
                    warn!(kid = ?jwk.common.key_id, %reason, "Skipping unusable JWK");
                    None
                }
            })
            .collect();

        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }

    fn find(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.iter().find(|k| k.kid == kid).cloned()
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

struct Shared<S> {
    source: S,
    current: RwLock<Option<Arc<KeySet>>>,
    /// Held for the whole fetch; guards the fetch, not the reads.
    refresh_lock: Mutex<()>,
}

impl<S: KeySource> Shared<S> {
    /// Fetch and install a new snapshot, unless a fresh one replaced
    /// `observed` while this call waited for the lock.
    async fn refresh_unless_replaced(
        &self,
        observed: Option<Arc<KeySet>>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<(), AuthError> {
        let _refreshing = self.refresh_lock.lock().await;

        if let Some(current) = self.current.read().await.as_ref() {
            let replaced = observed
                .as_ref()
                .map_or(true, |seen| !Arc::ptr_eq(seen, current));
            if replaced && current.is_fresh(ttl) {
                debug!("JWKS refreshed by another caller");
                return Ok(());
            }
        }

        let jwks = tokio::time::timeout(timeout, self.source.fetch())
            .await
            .map_err(|_| {
                AuthError::JwksUnavailable(format!("no response within {}ms", timeout.as_millis()))
            })??;

        let set = Arc::new(KeySet::from_jwks(jwks));
        info!(keys = set.keys.len(), "JWKS refreshed");
        *self.current.write().await = Some(set);
        Ok(())
    }
}

/// JWKS manager with caching.
///
/// Cloning is cheap; clones share the same cache.
pub struct JwksManager<S = HttpKeySource> {
    shared: Arc<Shared<S>>,
    cache_ttl: Duration,
    fetch_timeout: Duration,
}

impl<S> Clone for JwksManager<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            cache_ttl: self.cache_ttl,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<S: KeySource> JwksManager<S> {
    /// Create an empty cache over `source`. Nothing is fetched until the
    /// first lookup.
    pub fn new(source: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                current: RwLock::new(None),
                refresh_lock: Mutex::new(()),
            }),
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Bound each fetch by `timeout`.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// Resolve the signing key for a token's `kid`.
    ///
    /// # Errors
    /// - `InvalidHeader` if the token carried no `kid`
    /// - `NoMatchingKey` if the key is still absent after one refresh
    /// - `JwksUnavailable` if that refresh could not fetch the key set
    pub async fn resolve(&self, kid: Option<&str>) -> Result<Arc<SigningKey>, AuthError> {
        let kid = kid.ok_or(AuthError::InvalidHeader(MISSING_KEY_ID))?;

        let snapshot = self.snapshot().await;
        if let Some(set) = snapshot.as_ref().filter(|s| s.is_fresh(self.cache_ttl)) {
            if let Some(key) = set.find(kid) {
                return Ok(key);
            }
            debug!(kid, "Key id not in cached JWKS, refreshing");
        }

        self.refresh_after(snapshot).await?;

        self.snapshot()
            .await
            .and_then(|set| set.find(kid))
            .ok_or_else(|| {
                warn!(kid, "No matching key in JWKS after refresh");
                AuthError::NoMatchingKey
            })
    }

    /// Force refresh the JWKS cache.
    ///
    /// # Errors
    /// Returns `JwksUnavailable` if the fetch fails or times out.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let snapshot = self.snapshot().await;
        self.refresh_after(snapshot).await
    }

    /// Drop the cached key set; the next lookup fetches a new one.
    pub async fn invalidate(&self) {
        *self.shared.current.write().await = None;
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        self.snapshot()
            .await
            .is_some_and(|set| set.is_fresh(self.cache_ttl))
    }

    /// Number of usable keys in the current snapshot.
    pub async fn key_count(&self) -> usize {
        self.snapshot().await.map_or(0, |set| set.keys.len())
    }

    async fn snapshot(&self) -> Option<Arc<KeySet>> {
        self.shared.current.read().await.clone()
    }

    async fn refresh_after(&self, observed: Option<Arc<KeySet>>) -> Result<(), AuthError> {
        let shared = Arc::clone(&self.shared);
        let (ttl, timeout) = (self.cache_ttl, self.fetch_timeout);

        tokio::spawn(async move { shared.refresh_unless_replaced(observed, ttl, timeout).await })
            .await
            .map_err(|e| AuthError::JwksUnavailable(format!("refresh task failed: {e}")))?
    }
}
