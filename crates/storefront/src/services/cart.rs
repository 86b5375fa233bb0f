//! Per-customer cart state with latest-request-wins updates.
//!
//! Every mutation takes a [`Generation`] from the customer's sequencer before
//! calling the commerce API, applies an optimistic change stamped with it,
//! then dispatches the API's cart stamped with the same generation. When two
//! requests overlap, the older response arrives stamped older than what is
//! already applied and is dropped.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rigbay_core::cart::{CartAction, CartState, Dispatch};
use rigbay_core::catalog::{AddToCart, Cart};
use rigbay_core::sequence::{Generation, Sequencer};
use rigbay_core::{CartItemId, UserId, VariantId};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::commerce::{CommerceClient, CommerceError};

/// Slots idle longer than this are dropped and rebuilt from the API.
const SLOT_IDLE: Duration = Duration::from_secs(30 * 60);

/// A cart change requested by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOp {
    Add { variant_id: VariantId, quantity: u32 },
    SetQuantity { item: CartItemId, quantity: u32 },
    Remove { item: CartItemId },
    Clear,
}

impl CartOp {
    /// The optimistic local change, if one can be made before the API answers.
    fn optimistic(self) -> Option<CartAction> {
        match self {
            Self::Add { .. } => None,
            Self::SetQuantity { item, quantity } => Some(CartAction::SetQuantity { item, quantity }),
            Self::Remove { item } => Some(CartAction::Remove { item }),
            Self::Clear => Some(CartAction::Clear),
        }
    }
}

/// One customer's sequencer and cart state.
#[derive(Debug, Default)]
pub struct CartSlot {
    sequencer: Sequencer,
    state: RwLock<CartState>,
}

impl CartSlot {
    async fn dispatch(&self, generation: Generation, action: CartAction) -> Dispatch {
        self.state.write().await.dispatch(generation, action)
    }

    async fn snapshot(&self) -> CartState {
        self.state.read().await.clone()
    }
}

/// Cart slots for every active customer.
#[derive(Clone)]
pub struct CartSessions {
    slots: Cache<UserId, Arc<CartSlot>>,
}

impl Default for CartSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl CartSessions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(SLOT_IDLE)
                .build(),
        }
    }

    async fn slot(&self, user: UserId) -> Arc<CartSlot> {
        self.slots
            .get_with(user, async { Arc::new(CartSlot::default()) })
            .await
    }

    /// Last known cart without calling the API.
    pub async fn cached(&self, user: UserId) -> Option<CartState> {
        match self.slots.get(&user).await {
            Some(slot) => Some(slot.snapshot().await),
            None => None,
        }
    }

    /// Fetch the cart from the API and make it current.
    ///
    /// # Errors
    ///
    /// Returns the API error; local state keeps its previous items.
    #[instrument(skip(self, client, token), fields(user_id = %user))]
    pub async fn refresh(
        &self,
        client: &CommerceClient,
        user: UserId,
        token: &str,
    ) -> Result<CartState, CommerceError> {
        let slot = self.slot(user).await;
        let generation = slot.sequencer.next();
        let result = client.fetch_cart(token).await;
        Self::settle(&slot, generation, result).await
    }

    /// Apply a change locally and through the API.
    ///
    /// Returns the newest applied state, which may already reflect a later
    /// request than this one.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it on the state.
    #[instrument(skip(self, client, token), fields(user_id = %user))]
    pub async fn apply(
        &self,
        client: &CommerceClient,
        user: UserId,
        token: &str,
        op: CartOp,
    ) -> Result<CartState, CommerceError> {
        let slot = self.slot(user).await;
        let generation = slot.sequencer.next();

        if let Some(action) = op.optimistic() {
            slot.dispatch(generation, action).await;
        }

        let result = match op {
            CartOp::Add {
                variant_id,
                quantity,
            } => {
                client
                    .add_to_cart(
                        token,
                        &AddToCart {
                            variant_id,
                            quantity: quantity.max(1),
                        },
                    )
                    .await
            }
            CartOp::SetQuantity { item, quantity: 0 } | CartOp::Remove { item } => {
                client.remove_from_cart(token, item).await
            }
            CartOp::SetQuantity { item, quantity } => {
                client.update_cart_item(token, item, quantity).await
            }
            CartOp::Clear => client.clear_cart(token).await,
        };

        match Self::settle(&slot, generation, result).await {
            Ok(state) => Ok(state),
            Err(e) => {
                // The optimistic change may not hold; resync before reporting.
                let resync = slot.sequencer.next();
                if let Ok(cart) = client.fetch_cart(token).await {
                    slot.dispatch(resync, CartAction::Synced(cart)).await;
                    slot.dispatch(resync, CartAction::Failed(failure_message(&e)))
                        .await;
                }
                Err(e)
            }
        }
    }

    async fn settle(
        slot: &CartSlot,
        generation: Generation,
        result: Result<Cart, CommerceError>,
    ) -> Result<CartState, CommerceError> {
        match result {
            Ok(cart) => {
                if slot.dispatch(generation, CartAction::Synced(cart)).await == Dispatch::Stale {
                    debug!(%generation, "Dropped stale cart response");
                }
                Ok(slot.snapshot().await)
            }
            Err(e) => {
                slot.dispatch(generation, CartAction::Failed(failure_message(&e)))
                    .await;
                Err(e)
            }
        }
    }

    /// Drop a customer's slot (logout).
    pub async fn forget(&self, user: UserId) {
        self.slots.invalidate(&user).await;
    }
}

/// Customer-facing text for a failed cart call.
#[must_use]
pub fn failure_message(error: &CommerceError) -> String {
    match error {
        CommerceError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
        CommerceError::RateLimited(_) => "Too many cart updates. Please wait a moment.".to_string(),
        other => other
            .user_message()
            .map_or_else(|| "We couldn't update your cart. Please try again.".to_string(), String::from),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{parse_api_url, CommerceConfig};

    fn client_for(server: &MockServer) -> CommerceClient {
        CommerceClient::new(&CommerceConfig {
            api_url: parse_api_url("COMMERCE_API_URL", &server.uri()).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn cart(quantity: u32) -> serde_json::Value {
        json!({
            "items": [{
                "id": 7, "variantId": 30, "quantity": quantity,
                "variant": {"id": 30, "price": "1000", "stock": 9,
                            "product": {"id": 3, "name": "RTX 4070"}}
            }]
        })
    }

    #[tokio::test]
    async fn test_refresh_then_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart(2)))
            .mount(&server)
            .await;

        let sessions = CartSessions::new();
        let user = UserId::new(1);
        assert!(sessions.cached(user).await.is_none());

        let state = sessions.refresh(&client_for(&server), user, "tok").await.unwrap();
        assert_eq!(state.item_count(), 2);
        assert_eq!(sessions.cached(user).await.unwrap().item_count(), 2);

        sessions.forget(user).await;
        assert!(sessions.cached(user).await.is_none());
    }

    #[tokio::test]
    async fn test_slow_older_response_does_not_win() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/items/7"))
            .and(body_json(json!({"quantity": 1})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(cart(1))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/items/7"))
            .and(body_json(json!({"quantity": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart(3)))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let sessions = CartSessions::new();
        let user = UserId::new(9);
        let item = CartItemId::new(7);

        let (first, second) = tokio::join!(
            sessions.apply(&client, user, "tok", CartOp::SetQuantity { item, quantity: 1 }),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                sessions
                    .apply(&client, user, "tok", CartOp::SetQuantity { item, quantity: 3 })
                    .await
            },
        );
        assert!(first.is_ok());
        assert_eq!(second.unwrap().item_count(), 3);
        // The slow reply for quantity 1 landed last but was stale.
        assert_eq!(sessions.cached(user).await.unwrap().item_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/items/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let state = CartSessions::new()
            .apply(
                &client_for(&server),
                UserId::new(2),
                "tok",
                CartOp::SetQuantity {
                    item: CartItemId::new(7),
                    quantity: 0,
                },
            )
            .await
            .unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_failure_resyncs_and_records_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart(2)))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/items/7"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Only 9 in stock"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let sessions = CartSessions::new();
        let user = UserId::new(3);
        sessions.refresh(&client, user, "tok").await.unwrap();

        let err = sessions
            .apply(
                &client,
                user,
                "tok",
                CartOp::SetQuantity {
                    item: CartItemId::new(7),
                    quantity: 50,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(failure_message(&err), "Only 9 in stock");

        let state = sessions.cached(user).await.unwrap();
        assert_eq!(state.item_count(), 2);
        assert_eq!(state.last_error(), Some("Only 9 in stock"));
    }
}
