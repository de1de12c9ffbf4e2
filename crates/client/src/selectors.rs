//! Read-only projections over store snapshots.

use std::sync::Arc;

use shopfront_core::{Order, OrderId, OrderProgress, Product, ProductId, UserRole};

use crate::stores::{
    AuthState, CartState, NotificationState, OrderState, ProductState, WishlistState,
};

#[must_use]
pub const fn is_authenticated(auth: &AuthState) -> bool {
    auth.is_authenticated
}

#[must_use]
pub fn is_admin(auth: &AuthState) -> bool {
    auth.is_authenticated
        && auth
            .user
            .as_ref()
            .is_some_and(|u| u.role == UserRole::Admin)
}

#[must_use]
pub fn current_user_name(auth: &AuthState) -> Option<&str> {
    auth.user.as_ref().map(|u| u.name.as_str())
}

/// Sum of line quantities, not the number of lines.
#[must_use]
pub fn cart_item_count(cart: &CartState) -> u32 {
    cart.cart.item_count()
}

#[must_use]
pub fn cart_is_empty(cart: &CartState) -> bool {
    cart.cart.is_empty()
}

/// Products of the latest listing, in listing order.
#[must_use]
pub fn listed_products(products: &ProductState) -> Vec<&Product> {
    products
        .ids
        .iter()
        .filter_map(|id| products.products.get(id))
        .collect()
}

#[must_use]
pub fn current_product(products: &ProductState) -> Option<&Product> {
    products
        .current
        .as_ref()
        .and_then(|id| products.products.get(id))
}

#[must_use]
pub fn is_wishlisted(wishlist: &WishlistState, product_id: &ProductId) -> bool {
    wishlist.items.iter().any(|i| &i.product_id == product_id)
}

#[must_use]
pub const fn unread_count(notifications: &NotificationState) -> usize {
    notifications.unread
}

/// Step indicator for an order.
#[must_use]
pub fn order_progress(order: &Order) -> OrderProgress {
    order.status.progress()
}

/// Look an order up in the history, falling back to the current order.
#[must_use]
pub fn find_order<'a>(orders: &'a OrderState, id: &OrderId) -> Option<&'a Arc<Order>> {
    orders
        .orders
        .iter()
        .find(|o| &o.id == id)
        .or_else(|| orders.current.as_ref().filter(|o| &o.id == id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopfront_core::User;

    fn user(role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": role
        }))
        .unwrap()
    }

    fn product(id: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Product {id}"),
            "price": "9.99"
        }))
        .unwrap()
    }

    #[test]
    fn test_is_admin_requires_session_and_role() {
        let mut auth = AuthState {
            user: Some(user("admin")),
            is_authenticated: true,
            ..AuthState::default()
        };
        assert!(is_admin(&auth));
        assert_eq!(current_user_name(&auth), Some("Ada"));

        auth.is_authenticated = false;
        assert!(!is_admin(&auth));

        auth.is_authenticated = true;
        auth.user = Some(user("user"));
        assert!(!is_admin(&auth));
    }

    #[test]
    fn test_listed_products_follow_id_order() {
        let mut state = ProductState::default();
        for id in ["b", "a", "c"] {
            state.products.insert(ProductId::new(id), product(id));
        }
        state.ids = vec![ProductId::new("c"), ProductId::new("a")];
        state.current = Some(ProductId::new("b"));

        let listed: Vec<_> = listed_products(&state).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(listed, ["c", "a"]);
        assert_eq!(current_product(&state).unwrap().id.as_str(), "b");
    }

    #[test]
    fn test_find_order_falls_back_to_current() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": "o1",
            "items": [],
            "status": "shipped",
            "subtotal": "1.00",
            "tax": "0.00",
            "shippingCost": "0.00",
            "total": "1.00"
        }))
        .unwrap();
        let state = OrderState {
            current: Some(Arc::new(order)),
            ..OrderState::default()
        };

        let found = find_order(&state, &OrderId::new("o1")).unwrap();
        assert_eq!(
            order_progress(found),
            OrderProgress::Step { index: 3, total: 5 }
        );
        assert!(find_order(&state, &OrderId::new("o2")).is_none());
    }
}
