//! Per-tenant OAuth2 token cache with file-backed persistence.
//!
//! One [`TokenCache`] instance is shared across the process; it owns one
//! entry per tenant. Each entry splits the cached value (`RwLock`, read-
//! shared for a warm hit) from acquisition (`Mutex<()>`, held only while an
//! OAuth exchange for that tenant is in flight), matching spec §5's "reads
//! are lock-free or read-shared; writes hold the per-tenant lock".

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::TenantConfig;
use crate::error::{GatewayError, GatewayResult};

/// Tokens are considered usable only strictly before `expiry - margin`.
const TOKEN_SAFETY_MARGIN: chrono::Duration = chrono::Duration::seconds(60);

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - TOKEN_SAFETY_MARGIN
    }
}

/// On-disk record for a single tenant's cached token. Field names match the
/// persisted-state contract in spec §6.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedToken {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Milliseconds since epoch, per spec §6.
    expiry: i64,
    environment: String,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// One tenant's slot: the cached value is read-shared (any number of
/// concurrent lookups proceed without blocking each other), while
/// acquisition is exclusive so only one in-flight OAuth exchange happens
/// per tenant at a time.
#[derive(Default)]
struct TenantSlot {
    cached: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
}

/// Per-tenant token store, one [`TenantSlot`] per tenant.
pub struct TokenCache {
    http: reqwest::Client,
    base_dir: PathBuf,
    entries: RwLock<HashMap<&'static str, Arc<TenantSlot>>>,
}

impl TokenCache {
    pub fn new(http: reqwest::Client) -> Self {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".oic-mcp-gateway")
            .join("tokens");
        Self {
            http,
            base_dir,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, tenant: &'static str) -> Arc<TenantSlot> {
        if let Some(slot) = self.entries.read().await.get(tenant) {
            return slot.clone();
        }
        let mut entries = self.entries.write().await;
        entries.entry(tenant).or_insert_with(|| Arc::new(TenantSlot::default())).clone()
    }

    /// Fresh-start eviction of every tenant's persisted token, performed on
    /// both startup and shutdown (spec §4.4 "startup/shutdown hygiene").
    pub async fn evict_all(&self) {
        for &tenant in crate::config::TENANT_IDS {
            self.evict(tenant).await;
        }
    }

    pub async fn evict(&self, tenant: &str) {
        let slot = self.slot(leak_tenant(tenant)).await;
        // Exclude concurrent acquisitions while the cached value is cleared,
        // so a refresh in flight can't repopulate it with the token being
        // evicted.
        let _refresh_guard = slot.refresh.lock().await;
        *slot.cached.write().await = None;
        let path = self.token_path(tenant);
        if path.exists() {
            if let Err(err) = std::fs::remove_file(&path) {
                warn!(tenant, error = %err, "failed to remove persisted token file");
            }
        }
    }

    /// Returns a usable token for `tenant`, acquiring and caching a fresh
    /// one if necessary (spec §4.4 acquisition protocol, P1, P3).
    ///
    /// A warm hit only ever takes the shared read lock. A miss takes the
    /// per-tenant refresh mutex and rechecks the cache under it (another
    /// waiter may have already refreshed while this caller was queued)
    /// before making its own OAuth exchange.
    pub async fn get(&self, tenant: &str, config: &TenantConfig) -> GatewayResult<String> {
        let tenant_key = leak_tenant(tenant);
        let slot = self.slot(tenant_key).await;

        if let Some(cached) = slot.cached.read().await.as_ref() {
            if cached.is_usable(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let _refresh_guard = slot.refresh.lock().await;
        if let Some(cached) = slot.cached.read().await.as_ref() {
            if cached.is_usable(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.acquire(tenant, config).await?;
        let access_token = fresh.access_token.clone();
        self.persist(tenant, &fresh);
        *slot.cached.write().await = Some(fresh);
        Ok(access_token)
    }

    async fn acquire(&self, tenant: &str, config: &TenantConfig) -> GatewayResult<CachedToken> {
        debug!(tenant, "acquiring OAuth2 token via client-credentials grant");
        let credentials = format!("{}:{}", config.client_id, config.client_secret);
        let basic = base64::engine::general_purpose::STANDARD.encode(credentials);

        let mut form = vec![("grant_type", "client_credentials")];
        if !config.scope.is_empty() {
            form.push(("scope", config.scope.as_str()));
        }

        let response = self
            .http
            .post(&config.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .form(&form)
            .send()
            .await
            .map_err(|err| GatewayError::AuthenticationFailure {
                status: 0,
                body: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::AuthenticationFailure {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenEndpointResponse =
            response
                .json()
                .await
                .map_err(|err| GatewayError::AuthenticationFailure {
                    status: status.as_u16(),
                    body: err.to_string(),
                })?;

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        })
    }

    fn token_path(&self, tenant: &str) -> PathBuf {
        self.base_dir.join(format!("{tenant}.json"))
    }

    /// Write-to-temp-then-rename keeps a reader from ever observing a
    /// partially-written file (spec §6 "written atomically").
    fn persist(&self, tenant: &str, token: &CachedToken) {
        if let Err(err) = std::fs::create_dir_all(&self.base_dir) {
            warn!(tenant, error = %err, "failed to create token cache directory");
            return;
        }
        let record = PersistedToken {
            access_token: token.access_token.clone(),
            expiry: token.expires_at.timestamp_millis(),
            environment: tenant.to_string(),
        };
        let body = match serde_json::to_vec_pretty(&record) {
            Ok(body) => body,
            Err(err) => {
                warn!(tenant, error = %err, "failed to serialize persisted token");
                return;
            }
        };
        let final_path = self.token_path(tenant);
        let tmp_path = final_path.with_extension("json.tmp");
        if let Err(err) = std::fs::write(&tmp_path, body) {
            warn!(tenant, error = %err, "failed to write token cache file");
            return;
        }
        if let Err(err) = std::fs::rename(&tmp_path, &final_path) {
            warn!(tenant, error = %err, "failed to finalize token cache file");
        }
    }
}

fn leak_tenant(tenant: &str) -> &'static str {
    crate::config::TenantId::parse(tenant)
        .map(|id| id.as_str())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_within_margin_is_not_usable() {
        let token = CachedToken {
            access_token: "abc".into(),
            expires_at: Utc::now() + chrono::Duration::seconds(30),
        };
        assert!(!token.is_usable(Utc::now()));
    }

    #[test]
    fn token_outside_margin_is_usable() {
        let token = CachedToken {
            access_token: "abc".into(),
            expires_at: Utc::now() + chrono::Duration::seconds(300),
        };
        assert!(token.is_usable(Utc::now()));
    }
}
