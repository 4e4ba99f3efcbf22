//! Passphrase bound to the account it protects.

use std::fmt;

use zeroize::ZeroizeOnDrop;

/// Passphrase for one export or import call.
///
/// Not persisted anywhere; the password is zeroized on drop. The empty
/// password is the sentinel for "no encryption requested". `user_id` is the
/// identity the backup is bound to: it feeds the identity hash at export
/// time and the identity gate at import time.
#[derive(Clone, ZeroizeOnDrop)]
pub struct BackupPassphrase {
    pub password: String,
    pub user_id: String,
}

impl BackupPassphrase {
    pub fn new(password: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            user_id: user_id.into(),
        }
    }

    /// Plaintext export/import for this user.
    pub fn unencrypted(user_id: impl Into<String>) -> Self {
        Self::new("", user_id)
    }

    pub fn requests_encryption(&self) -> bool {
        !self.password.is_empty()
    }
}

impl fmt::Debug for BackupPassphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupPassphrase")
            .field("password", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
