//! Azure Active Directory authentication
//!
//! Credentials implement [`TokenCredential`]; the pipeline requests a token
//! for every call and [`CachedCredential`] makes that cheap by caching the
//! token until shortly before it expires.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Scope requested for ARM management-plane calls.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Default token issuer authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if the issuer did not report one (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// A bearer token plus its reported lifetime.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// Lifetime reported by the issuer, if any.
    pub expires_in: Option<Duration>,
}

/// Source of bearer tokens for the pipeline.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self, scope: &str) -> Result<AccessToken>;
}

/// Credential performing the OAuth2 client-credentials flow against Azure AD.
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Deserialize, Default)]
struct TokenError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("aznet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority: DEFAULT_AUTHORITY.to_string(),
            http,
        })
    }

    /// Build the credential from the conventional `AZURE_TENANT_ID`,
    /// `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET` environment variables.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| Error::Config(format!("{name} is not set")))
        };
        Self::new(
            var("AZURE_TENANT_ID")?,
            var("AZURE_CLIENT_ID")?,
            var("AZURE_CLIENT_SECRET")?,
        )
    }

    /// Replace the token authority (sovereign clouds, test servers).
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        let authority = authority.into();
        self.authority = authority.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let url = format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id);
        tracing::debug!("requesting token from {}", url);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("scope", scope),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail: TokenError = serde_json::from_slice(&body).unwrap_or_default();
            return Err(Error::Auth(format!(
                "token request failed with status {}: {}: {}",
                status, detail.error, detail.error_description
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::Auth(format!("invalid token response: {e}")))?;
        Ok(AccessToken {
            token: token.access_token,
            expires_in: token.expires_in.map(Duration::from_secs),
        })
    }
}

/// Fixed-token credential, primarily for tests and local tooling.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_in: None,
        })
    }
}

/// Caching wrapper around any [`TokenCredential`]
#[derive(Clone)]
pub struct CachedCredential {
    inner: Arc<dyn TokenCredential>,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl CachedCredential {
    pub fn new(inner: Arc<dyn TokenCredential>) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Drop the cached token and fetch a fresh one.
    pub async fn refresh(&self, scope: &str) -> Result<AccessToken> {
        {
            let mut cache = self.cache.write().await;
            *cache = None;
        }
        self.token(scope).await
    }
}

#[async_trait]
impl TokenCredential for CachedCredential {
    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        // Check cache first - but only return if token is still valid
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(AccessToken {
                        token: cached.token.clone(),
                        expires_in: None,
                    });
                }
                // Token expired or about to expire, will fetch new one
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        // Fetch new token
        let token = self.inner.token(scope).await?;

        let ttl = token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        // Cache it with expiry
        {
            let mut cache = self.cache.write().await;
            *cache = Some(CachedToken {
                token: token.token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCredential {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenCredential for CountingCredential {
        async fn token(&self, _scope: &str) -> Result<AccessToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken {
                token: "tok".to_string(),
                expires_in: Some(Duration::from_secs(3600)),
            })
        }
    }

    #[test]
    fn test_cached_token_expiry() {
        let valid = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(valid.is_valid());

        let expired = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(!expired.is_valid());
    }

    #[test]
    fn test_cache_reuses_token_until_refresh() {
        tokio_test::block_on(async {
            let inner = Arc::new(CountingCredential {
                calls: AtomicUsize::new(0),
            });
            let cached = CachedCredential::new(inner.clone());

            cached.token(MANAGEMENT_SCOPE).await.unwrap();
            cached.token(MANAGEMENT_SCOPE).await.unwrap();
            assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

            cached.refresh(MANAGEMENT_SCOPE).await.unwrap();
            assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        });
    }
}
