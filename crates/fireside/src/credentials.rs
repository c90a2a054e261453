//! Credentials issued by the identity service and the [`Authenticator`] seam
//! the store reads them through.

use std::future::Future;
use std::sync::Arc;

use fireside_common::AuthorizationToken;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::RwLock;

/// Subject id and bearer token for an authenticated user.
///
/// Deserializes directly from an identity toolkit sign-in response
/// (`localId`, `idToken`, `refreshToken`); unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Stable user id. Stands in for empty collection or document names.
    pub local_id: SmolStr,
    /// Short-lived ID token sent as the bearer token.
    pub id_token: SmolStr,
    /// Token used by the identity service to mint a new ID token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SmolStr>,
}

impl Credentials {
    /// Credentials without a refresh token.
    pub fn new(local_id: impl Into<SmolStr>, id_token: impl Into<SmolStr>) -> Self {
        Self {
            local_id: local_id.into(),
            id_token: id_token.into(),
            refresh_token: None,
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<SmolStr>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// The bearer token for the `Authorization` header.
    pub fn authorization(&self) -> AuthorizationToken {
        AuthorizationToken::Bearer(self.id_token.clone())
    }
}

/// Source of the credentials attached to each request.
///
/// Returning `None` means the store is not enabled; requests fail with
/// [`AuthError::NotAuthenticated`](fireside_common::error::AuthError::NotAuthenticated)
/// before anything is sent.
#[cfg_attr(not(target_arch = "wasm32"), trait_variant::make(Send))]
pub trait Authenticator {
    /// Current credentials, if signed in.
    fn credentials(&self) -> impl Future<Output = Option<Credentials>>;
}

impl Authenticator for Credentials {
    async fn credentials(&self) -> Option<Credentials> {
        Some(self.clone())
    }
}

impl Authenticator for Option<Credentials> {
    async fn credentials(&self) -> Option<Credentials> {
        self.clone()
    }
}

/// Swappable credentials: sign in, refresh or sign out without rebuilding
/// the store.
impl Authenticator for RwLock<Option<Credentials>> {
    async fn credentials(&self) -> Option<Credentials> {
        self.read().await.clone()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Authenticator + Sync + Send> Authenticator for Arc<T> {
    fn credentials(&self) -> impl Future<Output = Option<Credentials>> + Send {
        self.as_ref().credentials()
    }
}

#[cfg(target_arch = "wasm32")]
impl<T: Authenticator> Authenticator for Arc<T> {
    fn credentials(&self) -> impl Future<Output = Option<Credentials>> {
        self.as_ref().credentials()
    }
}
