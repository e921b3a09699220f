//! Session identity resolution and in-memory key custody.
//!
//! The core never issues or parses session tokens. A request arrives with
//! an [`AuthenticatedIdentity`] and the surrounding session layer resolves
//! it to an account through the [`SessionAuthenticator`] seam.

use crate::ServiceResult;
use veildrive_store::AccountId;
use zeroize::Zeroizing;

/// Proof of an authenticated request, as produced by the session layer.
#[derive(Clone, Debug)]
pub struct AuthenticatedIdentity {
    pub token: String,
}

/// Resolves an authenticated identity to the owning account.
pub trait SessionAuthenticator: Send + Sync {
    fn resolve(&self, identity: &AuthenticatedIdentity) -> ServiceResult<AccountId>;
}

/// Private keys unwrapped for the lifetime of one session.
///
/// Held only in memory and zeroized on drop — these bytes never reach
/// storage or logs.
pub struct UnlockedKeys {
    kem_private: Zeroizing<Vec<u8>>,
    sig_private: Zeroizing<Vec<u8>>,
}

impl UnlockedKeys {
    pub fn new(kem_private: Zeroizing<Vec<u8>>, sig_private: Zeroizing<Vec<u8>>) -> Self {
        Self {
            kem_private,
            sig_private,
        }
    }

    pub fn kem_private(&self) -> &[u8] {
        &self.kem_private
    }

    pub fn sig_private(&self) -> &[u8] {
        &self.sig_private
    }

    pub(crate) fn kem_private_cloned(&self) -> Zeroizing<Vec<u8>> {
        self.kem_private.clone()
    }

    pub(crate) fn sig_private_cloned(&self) -> Zeroizing<Vec<u8>> {
        self.sig_private.clone()
    }
}

/// An authenticated account with its keys unlocked.
pub struct Session {
    pub account_id: AccountId,
    pub keys: UnlockedKeys,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.account_id)
            .field("keys", &"<redacted>")
            .finish()
    }
}
