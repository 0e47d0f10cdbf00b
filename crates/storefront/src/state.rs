//! Application state shared across views.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::cart::CartManager;
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::navigation::Navigator;
use crate::notices::Notices;
use crate::session::{Session, SessionManager};
use crate::try_on::TryOnClient;

/// Every storefront component, wired together.
///
/// This struct is cheaply cloneable via `Arc`. All components share one API
/// client, so a 401 from any of them resets the one session.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionManager,
    cart: CartManager,
    catalog: CatalogClient,
    try_on: TryOnClient,
    notices: Notices,
}

impl Storefront {
    /// Wire the components together.
    ///
    /// Nothing runs until [`Storefront::start`] is called.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let notices = Notices::new();
        let api = ApiClient::new(&config.api, Arc::clone(&credentials));
        let session = SessionManager::new(api.clone(), credentials, navigator);
        let cart = CartManager::new(api.clone(), session.clone(), notices.clone());
        let catalog = CatalogClient::new(api.clone(), config.catalog_cache);
        let try_on = TryOnClient::new(api.clone(), notices.clone());

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                session,
                cart,
                catalog,
                try_on,
                notices,
            }),
        }
    }

    /// Wire the components with the credential file named in `config`.
    #[must_use]
    pub fn with_credential_file(config: StorefrontConfig, navigator: Arc<dyn Navigator>) -> Self {
        let credentials = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Self::new(config, credentials, navigator)
    }

    /// Start following the session with the cart and validate any persisted
    /// credential.
    ///
    /// Returns the settled session and the cart sync task.
    pub async fn start(&self) -> (Session, JoinHandle<()>) {
        let sync = self.inner.cart.spawn_session_sync();
        let session = self.inner.session.validate().await;
        tracing::info!(
            status = ?session.status(),
            api = %self.inner.api.base_url(),
            "Storefront started"
        );
        (session, sync)
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn try_on(&self) -> &TryOnClient {
        &self.inner.try_on
    }

    /// User-visible notices from every component.
    #[must_use]
    pub fn notices(&self) -> &Notices {
        &self.inner.notices
    }
}
