//! Identity resolution. The identity is looked up again for every operation;
//! nothing here caches it.

use portal_core::{AuthProvider, Identity};

use crate::error::AuthError;

/// The current identity, or `None` when nobody is signed in.
pub async fn resolve<A: AuthProvider>(auth: &A) -> Result<Option<Identity>, AuthError> {
  match auth.current_user().await {
    Ok(user) => Ok(user),
    Err(failure) => {
      tracing::error!(error = %failure, "session lookup failed");
      Err(failure.into())
    }
  }
}

/// The current identity; its absence is an error.
pub async fn require<A: AuthProvider>(auth: &A) -> Result<Identity, AuthError> {
  resolve(auth).await?.ok_or(AuthError::Missing)
}
