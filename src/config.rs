//! Tenant configuration, loaded once at startup from the process environment.
//!
//! The closed tenant set is fixed at build time (spec §4.4): adding an
//! environment is a code change, not a runtime one.

use std::collections::HashMap;
use std::fmt;

use crate::error::GatewayError;

/// The fixed set of upstream deployment environments this gateway knows
/// about. Extend this list (and nothing else) to add a tenant.
pub const TENANT_IDS: &[&str] = &["dev", "qa3", "prod1", "prod3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantId(&'static str);

impl TenantId {
    pub fn parse(raw: &str) -> Option<Self> {
        TENANT_IDS
            .iter()
            .find(|&&id| id == raw)
            .map(|&id| TenantId(id))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Credentials and endpoints for a single tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base_url: String,
    pub scope: String,
    pub integration_instance: String,
}

impl TenantConfig {
    /// A tenant is usable only once id, secret, and token URL are all
    /// present (spec §4.3 step 3).
    fn missing_field(&self) -> Option<&'static str> {
        if self.client_id.is_empty() {
            Some("client id")
        } else if self.client_secret.is_empty() {
            Some("client secret")
        } else if self.token_url.is_empty() {
            Some("token url")
        } else {
            None
        }
    }
}

/// Snapshot of every configured tenant, read once at startup and immutable
/// for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    tenants: HashMap<&'static str, TenantConfig>,
}

impl TenantRegistry {
    /// Load configuration for the fixed tenant set from the process
    /// environment, using the `KEY_TENANT` suffix convention from spec §6
    /// (e.g. `OIC_CLIENT_ID_DEV`).
    pub fn from_env() -> Self {
        let mut tenants = HashMap::new();
        for &id in TENANT_IDS {
            let suffix = id.to_uppercase();
            let config = TenantConfig {
                client_id: env_var("OIC_CLIENT_ID", &suffix),
                client_secret: env_var("OIC_CLIENT_SECRET", &suffix),
                token_url: env_var("OIC_TOKEN_URL", &suffix),
                api_base_url: env_var("OIC_API_BASE_URL", &suffix),
                scope: env_var("OIC_SCOPE", &suffix),
                integration_instance: env_var("OIC_INTEGRATION_INSTANCE", &suffix),
            };
            tenants.insert(id, config);
        }
        Self { tenants }
    }

    /// Returns the number of tenants with a complete credential set. Used
    /// only to decide whether startup should abort (spec §7: "only startup
    /// misconfiguration severe enough that no tenant is configured may
    /// abort startup").
    pub fn configured_count(&self) -> usize {
        self.tenants
            .values()
            .filter(|t| t.missing_field().is_none())
            .count()
    }

    pub fn config_for(&self, tenant: &str) -> Result<&TenantConfig, GatewayError> {
        let id = TenantId::parse(tenant).ok_or_else(|| GatewayError::UnknownTenant {
            tenant: tenant.to_string(),
        })?;
        let config = self
            .tenants
            .get(id.as_str())
            .expect("every TenantId has a registry entry");
        if let Some(missing) = config.missing_field() {
            return Err(GatewayError::TenantNotConfigured {
                tenant: tenant.to_string(),
                missing: missing.to_string(),
            });
        }
        Ok(config)
    }
}

fn env_var(base: &str, suffix: &str) -> String {
    std::env::var(format!("{base}_{suffix}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_all_tenant_env() {
        for &id in TENANT_IDS {
            let suffix = id.to_uppercase();
            for base in [
                "OIC_CLIENT_ID",
                "OIC_CLIENT_SECRET",
                "OIC_TOKEN_URL",
                "OIC_API_BASE_URL",
                "OIC_SCOPE",
                "OIC_INTEGRATION_INSTANCE",
            ] {
                std::env::remove_var(format!("{base}_{suffix}"));
            }
        }
    }

    #[test]
    fn unknown_tenant_is_rejected_before_checking_credentials() {
        clear_all_tenant_env();
        let registry = TenantRegistry::from_env();
        let err = registry.config_for("staging").unwrap_err();
        assert!(matches!(err, GatewayError::UnknownTenant { .. }));
    }

    #[test]
    fn incomplete_tenant_is_reported_as_not_configured() {
        clear_all_tenant_env();
        let registry = TenantRegistry::from_env();
        let err = registry.config_for("dev").unwrap_err();
        assert!(matches!(err, GatewayError::TenantNotConfigured { .. }));
    }

    #[test]
    fn fully_configured_tenant_resolves() {
        clear_all_tenant_env();
        std::env::set_var("OIC_CLIENT_ID_DEV", "id");
        std::env::set_var("OIC_CLIENT_SECRET_DEV", "secret");
        std::env::set_var("OIC_TOKEN_URL_DEV", "https://example.com/token");
        let registry = TenantRegistry::from_env();
        let config = registry.config_for("dev").expect("dev should resolve");
        assert_eq!(config.client_id, "id");
        clear_all_tenant_env();
    }
}
