#![forbid(unsafe_code)]

use mesa_kernel_contracts::policy::{AccessPolicy, Identity, PolicyDecision};

/// Pure allow/deny decision for a (policy, identity, purpose) triple.
///
/// Three ordered checks, first failure wins: pii flag, purpose, role.
/// Called on every consume attempt and never cached across requests,
/// since either the policy or the identity may have changed.
pub fn evaluate(policy: &AccessPolicy, identity: &Identity, purpose: &str) -> PolicyDecision {
    if policy.pii {
        return PolicyDecision::deny("pii must be false");
    }
    if !policy.allowed_purposes.iter().any(|p| p == purpose) {
        return PolicyDecision::deny(format!("purpose '{purpose}' not allowed"));
    }
    if !identity
        .roles
        .iter()
        .any(|role| policy.allowed_roles.contains(role))
    {
        return PolicyDecision::deny("no matching role");
    }
    PolicyDecision::allow()
}
