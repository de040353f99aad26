#![forbid(unsafe_code)]

use mesa_kernel_contracts::policy::{AccessPolicy, PolicyOverrides};

/// Pipeline-wide defaults, merged with caller overrides at product
/// build time.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub default_allowed_purposes: Vec<String>,
    pub default_allowed_roles: Vec<String>,
    pub default_retention_days: u32,
    pub product_version: u32,
}

impl PipelineConfig {
    pub fn mvp_v1() -> Self {
        Self {
            default_allowed_purposes: vec!["analytics".to_string()],
            default_allowed_roles: vec!["consumer".to_string()],
            default_retention_days: 30,
            product_version: 1,
        }
    }

    /// Merge caller overrides over the configured defaults. The `pii`
    /// override is discarded: every stored policy carries `pii: false`,
    /// and an override cannot weaken that.
    pub fn merged_policy(&self, overrides: Option<&PolicyOverrides>) -> AccessPolicy {
        let mut policy = AccessPolicy {
            allowed_purposes: self.default_allowed_purposes.clone(),
            allowed_roles: self.default_allowed_roles.clone(),
            retention_days: self.default_retention_days,
            pii: false,
        };
        if let Some(overrides) = overrides {
            if let Some(purposes) = &overrides.allowed_purposes {
                policy.allowed_purposes = purposes.clone();
            }
            if let Some(roles) = &overrides.allowed_roles {
                policy.allowed_roles = roles.clone();
            }
            if let Some(retention) = overrides.retention_days {
                policy.retention_days = retention;
            }
        }
        policy.pii = false;
        policy
    }
}
