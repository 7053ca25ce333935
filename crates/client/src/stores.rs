//! Client-side state stores.
//!
//! In-memory mirrors of the server-side user and cart state, in the shape
//! the web frontend keeps them. Cart mutations apply optimistically: the
//! local mirror updates first, the server call follows, and the mirror is
//! reconciled against the server's entry list (or rolled back on error).

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use clover_core::ProductId;

use crate::error::ClientError;
use crate::types::{CartEntry, CartProduct, CheckoutProduct, Coupon, User};
use crate::ApiClient;

/// Mirror of the signed-in user.
pub struct UserStore {
    client: Arc<ApiClient>,
    user: RwLock<Option<User>>,
}

impl UserStore {
    /// Create a store over a shared client.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            user: RwLock::new(None),
        }
    }

    /// The currently signed-in user, if any.
    pub async fn current(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// Sign up and remember the user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection; the mirror stays signed out.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let user = self.client.signup(name, email, password).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    /// Log in and remember the user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection; the mirror stays signed out.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let user = self.client.login(email, password).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    /// Log out and forget the user. The mirror is cleared even if the server
    /// call fails.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` on transport failure.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.client.logout().await;
        *self.user.write().await = None;
        result
    }

    /// Re-check the session against the server (e.g. on startup).
    ///
    /// A rejected session clears the mirror instead of erroring.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` on transport failure.
    pub async fn check_auth(&self) -> Result<Option<User>, ClientError> {
        match self.client.profile().await {
            Ok(user) => {
                *self.user.write().await = Some(user.clone());
                Ok(Some(user))
            }
            Err(ClientError::Api { .. } | ClientError::SessionExpired) => {
                *self.user.write().await = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Mirror of the cart and applied coupon.
pub struct CartStore {
    client: Arc<ApiClient>,
    state: RwLock<CartState>,
}

#[derive(Default, Clone)]
struct CartState {
    items: Vec<CartProduct>,
    coupon: Option<Coupon>,
}

/// Subtotal/discount/total snapshot of the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl CartStore {
    /// Create a store over a shared client.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            state: RwLock::new(CartState::default()),
        }
    }

    /// Current cart items.
    pub async fn items(&self) -> Vec<CartProduct> {
        self.state.read().await.items.clone()
    }

    /// Currently applied coupon.
    pub async fn coupon(&self) -> Option<Coupon> {
        self.state.read().await.coupon.clone()
    }

    /// Reload the cart from the server, replacing the mirror.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 401 when signed out.
    pub async fn load(&self) -> Result<Vec<CartProduct>, ClientError> {
        let items = self.client.cart().await?;
        self.state.write().await.items = items.clone();
        Ok(items)
    }

    /// Add a product to the cart, optimistically bumping the local mirror.
    ///
    /// # Errors
    ///
    /// Rolls the mirror back and returns the server error on failure.
    pub async fn add(&self, product: &CartProduct) -> Result<(), ClientError> {
        let snapshot = self.state.read().await.clone();

        {
            let mut state = self.state.write().await;
            apply_add(&mut state.items, product);
        }

        match self.client.add_to_cart(product.id, Some(1)).await {
            Ok(entries) => {
                let mut state = self.state.write().await;
                reconcile(&mut state.items, &entries);
                Ok(())
            }
            Err(e) => {
                debug!("add_to_cart failed, rolling back: {e}");
                *self.state.write().await = snapshot;
                Err(e)
            }
        }
    }

    /// Set a cart entry's quantity (0 removes), optimistically.
    ///
    /// # Errors
    ///
    /// Rolls the mirror back and returns the server error on failure.
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let snapshot = self.state.read().await.clone();

        {
            let mut state = self.state.write().await;
            apply_quantity(&mut state.items, product_id, quantity);
        }

        match self
            .client
            .update_quantity(product_id, i64::from(quantity))
            .await
        {
            Ok(entries) => {
                let mut state = self.state.write().await;
                reconcile(&mut state.items, &entries);
                Ok(())
            }
            Err(e) => {
                debug!("update_quantity failed, rolling back: {e}");
                *self.state.write().await = snapshot;
                Err(e)
            }
        }
    }

    /// Remove a product (or clear the cart with `None`), optimistically.
    ///
    /// # Errors
    ///
    /// Rolls the mirror back and returns the server error on failure.
    pub async fn remove(&self, product_id: Option<ProductId>) -> Result<(), ClientError> {
        let snapshot = self.state.read().await.clone();

        {
            let mut state = self.state.write().await;
            match product_id {
                Some(id) => state.items.retain(|i| i.id != id),
                None => state.items.clear(),
            }
        }

        match self.client.remove_from_cart(product_id).await {
            Ok(entries) => {
                let mut state = self.state.write().await;
                reconcile(&mut state.items, &entries);
                Ok(())
            }
            Err(e) => {
                debug!("remove_from_cart failed, rolling back: {e}");
                *self.state.write().await = snapshot;
                Err(e)
            }
        }
    }

    /// Validate and apply a coupon to the mirror.
    ///
    /// # Errors
    ///
    /// Returns the server rejection; the mirror keeps its previous coupon.
    pub async fn apply_coupon(&self, code: &str) -> Result<Coupon, ClientError> {
        let coupon = self.client.validate_coupon(code).await?;
        self.state.write().await.coupon = Some(coupon.clone());
        Ok(coupon)
    }

    /// Drop the applied coupon from the mirror.
    pub async fn remove_coupon(&self) {
        self.state.write().await.coupon = None;
    }

    /// Totals over the mirrored cart, with the mirrored coupon applied.
    pub async fn totals(&self) -> CartTotals {
        let state = self.state.read().await;
        compute_totals(&state.items, state.coupon.as_ref())
    }

    /// The cart snapshot to send to checkout-session creation.
    pub async fn checkout_products(&self) -> Vec<CheckoutProduct> {
        self.state
            .read()
            .await
            .items
            .iter()
            .map(CheckoutProduct::from)
            .collect()
    }
}

/// Optimistic add: merge into an existing entry or append with quantity 1.
fn apply_add(items: &mut Vec<CartProduct>, product: &CartProduct) {
    if let Some(existing) = items.iter_mut().find(|i| i.id == product.id) {
        existing.quantity += 1;
    } else {
        let mut product = product.clone();
        product.quantity = 1;
        items.push(product);
    }
}

/// Optimistic quantity update: zero removes the entry.
fn apply_quantity(items: &mut Vec<CartProduct>, product_id: ProductId, quantity: i32) {
    if quantity == 0 {
        items.retain(|i| i.id != product_id);
    } else if let Some(item) = items.iter_mut().find(|i| i.id == product_id) {
        item.quantity = quantity;
    }
}

/// Reconcile the mirror against the server's entry list: adopt the server's
/// quantities and drop entries the server no longer has. Product data for
/// entries the mirror has never seen arrives on the next [`CartStore::load`].
fn reconcile(items: &mut Vec<CartProduct>, entries: &[CartEntry]) {
    items.retain(|i| entries.iter().any(|e| e.product_id == i.id));
    for item in items {
        if let Some(entry) = entries.iter().find(|e| e.product_id == item.id) {
            item.quantity = entry.quantity;
        }
    }
}

/// Subtotal minus the coupon discount.
fn compute_totals(items: &[CartProduct], coupon: Option<&Coupon>) -> CartTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum();

    let discount = coupon.map_or(Decimal::ZERO, |c| {
        (subtotal * Decimal::from(c.discount_percentage) / Decimal::from(100)).round_dp(2)
    });

    CartTotals {
        subtotal,
        discount,
        total: subtotal - discount,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, price: &str, quantity: i32) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: price.parse().unwrap(),
            image: None,
            category: "misc".to_owned(),
            quantity,
        }
    }

    fn entry(id: i32, quantity: i32) -> CartEntry {
        CartEntry {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_apply_add_merges_and_appends() {
        let mut items = vec![product(1, "10.00", 2)];

        apply_add(&mut items, &product(1, "10.00", 1));
        assert_eq!(items[0].quantity, 3);

        apply_add(&mut items, &product(2, "5.00", 7));
        assert_eq!(items.len(), 2);
        // New entries always start at quantity 1, whatever the source said.
        assert_eq!(items[1].quantity, 1);
    }

    #[test]
    fn test_apply_quantity_zero_removes() {
        let mut items = vec![product(1, "10.00", 2), product(2, "5.00", 1)];

        apply_quantity(&mut items, ProductId::new(1), 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ProductId::new(2));

        apply_quantity(&mut items, ProductId::new(2), 4);
        assert_eq!(items[0].quantity, 4);
    }

    #[test]
    fn test_reconcile_adopts_server_state() {
        let mut items = vec![product(1, "10.00", 5), product(2, "5.00", 1)];

        // Server kept product 1 at a different quantity and dropped product 2.
        reconcile(&mut items, &[entry(1, 3)]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ProductId::new(1));
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn test_compute_totals_without_coupon() {
        let items = vec![product(1, "10.00", 2), product(2, "5.50", 1)];
        let totals = compute_totals(&items, None);

        assert_eq!(totals.subtotal, "25.50".parse::<Decimal>().unwrap());
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_compute_totals_with_coupon() {
        let items = vec![product(1, "150.00", 2)];
        let coupon = Coupon {
            code: "GIFTAAAAAA".to_owned(),
            discount_percentage: 10,
        };

        let totals = compute_totals(&items, Some(&coupon));
        assert_eq!(totals.subtotal, "300.00".parse::<Decimal>().unwrap());
        assert_eq!(totals.discount, "30.00".parse::<Decimal>().unwrap());
        assert_eq!(totals.total, "270.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_compute_totals_empty_cart() {
        let totals = compute_totals(&[], None);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }
}
