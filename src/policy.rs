//! Host capability checks.
//!
//! Administrative operations (revoking another user's tokens, sweeping
//! partitions) need an authorization decision that only the host
//! application can make. Hosts implement [`CapabilityProvider`] and gate
//! those call sites with [`require_capability`]; the library never probes
//! user objects for methods or features.

use crate::error::AuthError;

/// Capability required to revoke tokens belonging to other users.
pub const CAP_REVOKE_TOKENS: &str = "tokens:revoke";

/// Capability required to run the expiry sweep.
pub const CAP_SWEEP_TOKENS: &str = "tokens:sweep";

/// Host-implemented capability lookup.
pub trait CapabilityProvider: Send + Sync {
    /// Whether the given user holds the named capability.
    fn has_capability(&self, user_id: &str, capability: &str) -> bool;
}

/// Check a capability, turning a missing one into an error.
///
/// # Errors
///
/// Returns [`AuthError::MissingCapability`] when the provider denies the
/// capability.
pub fn require_capability(
    provider: &dyn CapabilityProvider,
    user_id: &str,
    capability: &str,
) -> Result<(), AuthError> {
    if provider.has_capability(user_id, capability) {
        Ok(())
    } else {
        Err(AuthError::MissingCapability(capability.to_string()))
    }
}
