//! Key layout for the ledger's key-value store.
//!
//! Every key lives under the `imagenmax:` prefix so the ledger can share a
//! store with other data.

use imagenmax_core::Identity;

/// Prefix shared by all ledger keys.
pub const PREFIX: &str = "imagenmax";

/// Key holding the anonymous session account.
pub const ANONYMOUS_ACCOUNT_KEY: &str = "imagenmax:account:anonymous";

/// Key holding the identity of the last logged-in user.
pub const LAST_IDENTITY_KEY: &str = "imagenmax:session:last_identity";

/// Create the account key for an identity.
///
/// Identities are already normalised, so `Ada@Example.com` and
/// `ada@example.com` share a key.
#[must_use]
pub fn account_key(identity: &Identity) -> String {
    format!("{PREFIX}:account:user:{identity}")
}

/// Key for an account record, anonymous when `identity` is `None`.
#[must_use]
pub fn account_key_for(identity: Option<&Identity>) -> String {
    identity.map_or_else(|| ANONYMOUS_ACCOUNT_KEY.to_string(), account_key)
}
