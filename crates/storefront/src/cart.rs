//! Server-authoritative cart.
//!
//! Every successful cart call returns the complete cart, which replaces the
//! local copy wholesale. Nothing is merged and totals are never computed here.
//!
//! Responses can arrive out of order. Each request takes a ticket when it is
//! dispatched and its response is applied only if:
//!
//! - no response with a newer ticket has been applied already, and
//! - the session is still authenticated with the generation the request was
//!   started under.
//!
//! The cart follows the session through [`CartManager::spawn_session_sync`]:
//! it is fetched on every new sign-in and dropped on sign-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use virtual_wardrobe_core::{Cart, CartItemId, ProductId};

use crate::api::ApiClient;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::notices::Notices;
use crate::session::{SessionManager, SessionStatus};

const CART_PATH: &str = "/cart";
const CART_ITEMS_PATH: &str = "/cart/items";

/// Cart state observed by the drawer, header badge and checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Latest server snapshot; `None` while signed out or not yet fetched.
    pub cart: Option<Cart>,
    /// A cart request is in flight.
    pub busy: bool,
    /// The cart drawer is open.
    pub drawer_open: bool,
}

impl CartState {
    /// Units in the cart, for the header badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }
}

#[derive(Serialize)]
struct AddItemRequest<'a> {
    product_id: ProductId,
    quantity: u32,
    size: &'a str,
    color: &'a str,
}

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Applied,
    /// A newer response was applied first.
    Superseded,
    /// The session ended or changed while the request was in flight.
    SessionChanged,
}

/// Owns the cart state.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    session: SessionManager,
    notices: Notices,
    state: watch::Sender<CartState>,
    in_flight: AtomicUsize,
    next_ticket: AtomicU64,
    applied_ticket: AtomicU64,
}

/// Marks the cart busy for as long as it lives.
struct BusyGuard<'a> {
    inner: &'a CartInner,
}

impl<'a> BusyGuard<'a> {
    fn new(inner: &'a CartInner) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        inner.sync_busy();
        Self { inner }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.sync_busy();
    }
}

impl CartManager {
    /// Create a cart manager reading the session from `session`.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionManager, notices: Notices) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                notices,
                state,
                in_flight: AtomicUsize::new(0),
                next_ticket: AtomicU64::new(0),
                applied_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// Current cart state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Observe cart state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.state.borrow().item_count()
    }

    /// Open or close the cart drawer.
    pub fn set_drawer_open(&self, open: bool) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.drawer_open != open;
            state.drawer_open = open;
            changed
        });
    }

    /// Drop the local cart. No request is made.
    pub fn clear(&self) {
        self.inner.state.send_if_modified(|state| state.cart.take().is_some());
    }

    /// Fetch the cart and replace local state with it.
    ///
    /// Failures are logged, not shown to the user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotAuthenticated`] without a request when signed
    /// out, otherwise any API error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart> {
        let generation = self
            .inner
            .authenticated_generation()
            .ok_or(AppError::NotAuthenticated)?;

        let ticket = self.inner.take_ticket();
        let _busy = BusyGuard::new(&self.inner);

        match self.inner.api.get::<Cart>(CART_PATH).await {
            Ok(cart) => {
                let applied = self.inner.apply(ticket, Some(generation), &cart, false);
                tracing::debug!(ticket, ?applied, items = cart.items.len(), "Cart fetched");
                Ok(cart)
            }
            Err(e) => {
                let err = AppError::from(e);
                err.report("cart.refresh");
                Err(err)
            }
        }
    }

    /// Add `quantity` units of a product variant.
    ///
    /// Signed-out users get a notice and no request is made. On success the
    /// returned cart replaces local state and the drawer opens.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotAuthenticated`] when signed out,
    /// [`AppError::InvalidInput`] for a zero quantity, otherwise any API error.
    #[instrument(skip(self, product_id, size, color), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        product_id: ProductId,
        size: &str,
        color: &str,
        quantity: u32,
    ) -> Result<Cart> {
        let Some(generation) = self.inner.authenticated_generation() else {
            self.inner
                .notices
                .error("Please sign in to add items to cart");
            return Err(AppError::NotAuthenticated);
        };

        if quantity == 0 {
            return Err(AppError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = product_id.to_string();
        add_breadcrumb(
            "cart",
            "Add item",
            Some(&[("product_id", product.as_str()), ("size", size), ("color", color)]),
        );

        let request = AddItemRequest {
            product_id,
            quantity,
            size,
            color,
        };

        let ticket = self.inner.take_ticket();
        let _busy = BusyGuard::new(&self.inner);

        match self
            .inner
            .api
            .post_json::<_, Cart>(CART_ITEMS_PATH, &request)
            .await
        {
            Ok(cart) => {
                let applied = self.inner.apply(ticket, Some(generation), &cart, true);
                tracing::info!(ticket, ?applied, items = cart.item_count(), "Added to cart");
                self.inner.notices.success("Added to cart");
                Ok(cart)
            }
            Err(e) => {
                let err = AppError::from(e);
                err.report("cart.add_item");
                self.inner.notices.error("Failed to add item to cart");
                Err(err)
            }
        }
    }

    /// Remove a cart line.
    ///
    /// The request goes out even when signed out; the server decides.
    ///
    /// # Errors
    ///
    /// Returns any API error. A 401 has already reset the session by then.
    #[instrument(skip(self, item_id), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<Cart> {
        let generation = self.inner.authenticated_generation();

        let item = item_id.to_string();
        add_breadcrumb("cart", "Remove item", Some(&[("item_id", item.as_str())]));

        let ticket = self.inner.take_ticket();
        let _busy = BusyGuard::new(&self.inner);

        match self
            .inner
            .api
            .delete::<Cart>(&format!("{CART_ITEMS_PATH}/{item_id}"))
            .await
        {
            Ok(cart) => {
                let applied = self.inner.apply(ticket, generation, &cart, false);
                tracing::info!(ticket, ?applied, items = cart.item_count(), "Removed from cart");
                self.inner.notices.success("Item removed");
                Ok(cart)
            }
            Err(e) => {
                let err = AppError::from(e);
                err.report("cart.remove_item");
                self.inner.notices.error("Failed to remove item");
                Err(err)
            }
        }
    }

    /// Follow the session: drop the cart and fetch it again on every new
    /// sign-in, and drop it on sign-out.
    ///
    /// Runs until the returned task is aborted.
    pub fn spawn_session_sync(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let mut sessions = self.inner.session.subscribe();

        tokio::spawn(async move {
            let mut fetched_generation = None;
            loop {
                let session = sessions.borrow_and_update().clone();
                match session.status() {
                    SessionStatus::Authenticated
                        if fetched_generation != Some(session.generation()) =>
                    {
                        fetched_generation = Some(session.generation());
                        manager.clear();
                        let manager = manager.clone();
                        tokio::spawn(async move {
                            // Already reported by refresh.
                            let _ = manager.refresh().await;
                        });
                    }
                    SessionStatus::Unauthenticated => {
                        fetched_generation = None;
                        manager.clear();
                    }
                    _ => {}
                }

                if sessions.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

impl CartInner {
    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn authenticated_generation(&self) -> Option<u64> {
        let session = self.session.session();
        session.is_authenticated().then(|| session.generation())
    }

    fn sync_busy(&self) {
        self.state.send_if_modified(|state| {
            let busy = self.in_flight.load(Ordering::SeqCst) > 0;
            let changed = state.busy != busy;
            state.busy = busy;
            changed
        });
    }

    /// Apply a snapshot received for `ticket`, subject to ordering and
    /// session checks.
    fn apply(
        &self,
        ticket: u64,
        generation: Option<u64>,
        cart: &Cart,
        open_drawer: bool,
    ) -> Applied {
        let mut applied = Applied::SessionChanged;

        self.state.send_if_modified(|state| {
            if generation.is_none() || self.authenticated_generation() != generation {
                applied = Applied::SessionChanged;
                return false;
            }

            let mut changed = false;
            if open_drawer && !state.drawer_open {
                state.drawer_open = true;
                changed = true;
            }

            if self.applied_ticket.fetch_max(ticket, Ordering::SeqCst) > ticket {
                applied = Applied::Superseded;
                return changed;
            }

            state.cart = Some(cart.clone());
            applied = Applied::Applied;
            true
        });

        applied
    }
}
