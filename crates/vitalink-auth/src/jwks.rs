//! JWKS (JSON Web Key Set) types, publication and cached fetching.
//!
//! The identity authority publishes a set with a single EC P-256 signature
//! key; the gateway fetches it lazily, re-fetches once when a `kid` misses,
//! and falls back to the last-known set when the authority is unreachable.

use crate::error::AuthError;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// An EC JSON Web Key as defined in RFC 7517/7518.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Jwk {
    /// Key type, always "EC".
    pub kty: String,

    /// Curve, always "P-256".
    pub crv: String,

    /// Key ID.
    pub kid: String,

    /// Public key use ("sig").
    #[serde(rename = "use")]
    pub key_use: String,

    /// Algorithm ("ES256").
    pub alg: String,

    /// X coordinate, base64url without padding.
    pub x: String,

    /// Y coordinate, base64url without padding.
    pub y: String,
}

impl Jwk {
    /// Build a verification key from the JWK coordinates.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` when the coordinates do not decode
    /// to a valid P-256 point.
    pub fn to_decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if self.kty != "EC" || self.crv != "P-256" {
            return Err(AuthError::InvalidKey(format!(
                "unsupported key type {}/{}",
                self.kty, self.crv
            )));
        }
        DecodingKey::from_ec_components(&self.x, &self.y)
            .map_err(|e| AuthError::InvalidKey(format!("invalid EC coordinates: {e}")))
    }
}

/// A JSON Web Key Set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwkSet {
    /// Array of JWK values.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find a key by its kid.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// Cached JWKS entry.
struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS client with caching and stale fallback.
///
/// Fetch failures are tolerated as long as a previously fetched set is
/// available; the verifier then works against last-known keys.
#[derive(Clone)]
pub struct JwksClient {
    url: String,
    cache: Arc<RwLock<Option<CachedJwks>>>,
    cache_ttl: Duration,
    http_client: reqwest::Client,
}

impl JwksClient {
    /// Create a new JWKS client for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JwksFetchFailed` if the HTTP client cannot be
    /// created.
    pub fn new(url: impl Into<String>) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AuthError::JwksFetchFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            cache: Arc::new(RwLock::new(None)),
            cache_ttl: Duration::from_secs(300),
            http_client,
        })
    }

    /// Set the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Fetch JWKS from the endpoint and update the cache.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JwksFetchFailed` if the fetch fails; the cached
    /// set, if any, is left untouched.
    pub async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(format!("Invalid JSON: {e}")))?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });

        Ok(jwks)
    }

    /// Get the key set, serving from cache while fresh and falling back to
    /// the stale cache when a refresh fails.
    pub async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(cached.jwks.clone());
                }
            }
        }

        match self.fetch_jwks().await {
            Ok(jwks) => Ok(jwks),
            Err(err) => {
                let cache = self.cache.read().await;
                if let Some(ref cached) = *cache {
                    tracing::warn!(error = %err, "JWKS refresh failed, using last-known key set");
                    Ok(cached.jwks.clone())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Get a key by kid, re-fetching once on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyNotFound` if the key is absent after the
    /// re-fetch.
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(key) = jwks.find_key(kid) {
            return Ok(key.clone());
        }

        match self.fetch_jwks().await {
            Ok(jwks) => jwks
                .find_key(kid)
                .cloned()
                .ok_or_else(|| AuthError::KeyNotFound(kid.to_string())),
            Err(_) => Err(AuthError::KeyNotFound(kid.to_string())),
        }
    }

    /// Clear the cache.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("url", &self.url)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}
