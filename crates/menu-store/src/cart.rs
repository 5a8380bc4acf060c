//! # Cart Aggregation Engine
//!
//! Owns the session's [`ShoppingCart`], persists it after every mutation
//! and drives the transient "item added" notification.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add_item(item)                                                        │
//! │     │                                                                   │
//! │     ├─ one synchronous update ─────────────────────────────────────┐   │
//! │     │   merge by (id, options key) or append                       │   │
//! │     │   recompute subtotal / taxes / discount / total              │   │
//! │     │   last_added = item, show_notification = true, generation+1  │   │
//! │     └──────────────────────────────────────────────────────────────┘   │
//! │     │                                                                   │
//! │     ├─► spawn: sleep(delay) ─► clear flag if generation unchanged      │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  persist(snapshot) ── failure ──► warn!, persist_error = message       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The in-memory cart is authoritative. A failed write never fails the
//! mutation that caused it; the next successful write clears the error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use menu_core::{
    CartItem, CoreError, CoreResult, Money, PromotionCartItem, ShoppingCart, MAX_CART_LINES,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{StoreError, StoreResult};
use crate::persistence::PersistenceAdapter;
use crate::subject::{Subject, Subscription};

// =============================================================================
// Cart View
// =============================================================================

/// The most recent line passed to `add_item` / `add_promotion`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "line", rename_all = "camelCase")]
pub enum LastAdded {
    Item(CartItem),
    Promotion(PromotionCartItem),
}

/// Everything the cart UI renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart: ShoppingCart,
    /// Whether the cart drawer is open.
    pub is_open: bool,
    pub last_added: Option<LastAdded>,
    pub show_notification: bool,
    /// Message of the last failed snapshot write, cleared by the next
    /// successful one.
    pub persist_error: Option<String>,
}

// =============================================================================
// Engine
// =============================================================================

struct EngineInner {
    subject: Subject<CartView>,
    persistence: Arc<dyn PersistenceAdapter>,
    storage_key: String,
    notification_delay: Duration,
    max_lines: usize,
    /// Bumped by every add. A pending auto-clear only fires if it still
    /// matches.
    generation: AtomicU64,
    /// Serializes snapshot writes so an older snapshot never lands last.
    persist_lock: tokio::sync::Mutex<()>,
}

/// Cheap to clone; clones share one cart.
#[derive(Clone)]
pub struct CartAggregationEngine {
    inner: Arc<EngineInner>,
}

impl CartAggregationEngine {
    /// Starts with an empty cart.
    pub fn new(persistence: Arc<dyn PersistenceAdapter>, config: &ClientConfig) -> Self {
        Self::with_cart(persistence, config, ShoppingCart::new(config.tax_rate()))
    }

    /// Starts from the persisted snapshot, or an empty cart if there is
    /// none or it cannot be read.
    pub async fn restore(persistence: Arc<dyn PersistenceAdapter>, config: &ClientConfig) -> Self {
        let key = config.cart.storage_key.as_str();

        let mut cart = match persistence.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<ShoppingCart>(&bytes) {
                Ok(cart) => {
                    info!(key, lines = cart.line_count(), "Cart restored");
                    cart
                }
                Err(e) => {
                    warn!(key, error = %e, "Stored cart is corrupt, starting empty");
                    ShoppingCart::default()
                }
            },
            Ok(None) => {
                debug!(key, "No stored cart, starting empty");
                ShoppingCart::default()
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored cart, starting empty");
                ShoppingCart::default()
            }
        };
        cart.set_tax_rate(config.tax_rate());

        Self::with_cart(persistence, config, cart)
    }

    fn with_cart(
        persistence: Arc<dyn PersistenceAdapter>,
        config: &ClientConfig,
        cart: ShoppingCart,
    ) -> Self {
        CartAggregationEngine {
            inner: Arc::new(EngineInner {
                subject: Subject::new(CartView {
                    cart,
                    ..CartView::default()
                }),
                persistence,
                storage_key: config.cart.storage_key.clone(),
                notification_delay: config.notification_delay(),
                max_lines: config.cart.max_lines.min(MAX_CART_LINES),
                generation: AtomicU64::new(0),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a dish line, merging with an identical `(id, options)` line.
    pub async fn add_item(&self, item: CartItem) -> StoreResult<()> {
        let max = self.inner.max_lines;
        let id = item.id.clone();

        let generation = self.inner.subject.update(|view| -> CoreResult<u64> {
            let is_new = view.cart.find_item(&item.id, &item.options_key()).is_none();
            if is_new && view.cart.line_count() >= max {
                return Err(CoreError::CartTooLarge { max });
            }
            view.cart.add_item(item.clone())?;
            Ok(self.announce(view, LastAdded::Item(item)))
        });
        let generation = self.reject_on_error("add_item", generation)?;

        debug!(id = %id, "Item added to cart");
        self.schedule_notification_clear(generation);
        self.persist().await;
        Ok(())
    }

    /// Adds a promotion line, merging by promotion id.
    pub async fn add_promotion(&self, promo: PromotionCartItem) -> StoreResult<()> {
        let max = self.inner.max_lines;
        let promotion_id = promo.promotion_id.clone();

        let generation = self.inner.subject.update(|view| -> CoreResult<u64> {
            let is_new = view.cart.find_promotion(&promo.promotion_id).is_none();
            if is_new && view.cart.line_count() >= max {
                return Err(CoreError::CartTooLarge { max });
            }
            view.cart.add_promotion(promo.clone())?;
            Ok(self.announce(view, LastAdded::Promotion(promo)))
        });
        let generation = self.reject_on_error("add_promotion", generation)?;

        debug!(promotion_id = %promotion_id, "Promotion added to cart");
        self.schedule_notification_clear(generation);
        self.persist().await;
        Ok(())
    }

    /// Removes dish lines. Returns the number of lines removed.
    pub async fn remove_item(&self, id: &str, options_key: Option<&str>) -> usize {
        let removed = self
            .inner
            .subject
            .update(|view| view.cart.remove_item(id, options_key));
        debug!(id, removed, "Item removed from cart");
        self.persist().await;
        removed
    }

    pub async fn remove_promotion(&self, promotion_id: &str) -> usize {
        let removed = self
            .inner
            .subject
            .update(|view| view.cart.remove_promotion(promotion_id));
        debug!(promotion_id, removed, "Promotion removed from cart");
        self.persist().await;
        removed
    }

    pub async fn update_quantity(
        &self,
        id: &str,
        quantity: i64,
        options_key: Option<&str>,
    ) -> StoreResult<()> {
        let result = self
            .inner
            .subject
            .update(|view| view.cart.update_quantity(id, quantity, options_key));
        self.reject_on_error("update_quantity", result)?;
        self.persist().await;
        Ok(())
    }

    pub async fn update_promotion_quantity(
        &self,
        promotion_id: &str,
        quantity: i64,
    ) -> StoreResult<()> {
        let result = self
            .inner
            .subject
            .update(|view| view.cart.update_promotion_quantity(promotion_id, quantity));
        self.reject_on_error("update_promotion_quantity", result)?;
        self.persist().await;
        Ok(())
    }

    /// Applies a cart-level discount (coupon).
    pub async fn set_discount(&self, amount: Money) {
        self.inner.subject.update(|view| view.cart.set_discount(amount));
        self.persist().await;
    }

    pub async fn clear(&self) {
        self.inner.subject.update(|view| view.cart.clear());
        info!("Cart cleared");
        self.persist().await;
    }

    // =========================================================================
    // UI State
    // =========================================================================

    pub fn dismiss_notification(&self) {
        self.inner
            .subject
            .update(|view| view.show_notification = false);
    }

    pub fn open_cart(&self) {
        self.inner.subject.update(|view| view.is_open = true);
    }

    pub fn close_cart(&self) {
        self.inner.subject.update(|view| view.is_open = false);
    }

    pub fn toggle_cart(&self) {
        self.inner.subject.update(|view| view.is_open = !view.is_open);
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn view(&self) -> CartView {
        self.inner.subject.snapshot()
    }

    pub fn cart(&self) -> ShoppingCart {
        self.inner.subject.read(|view| view.cart.clone())
    }

    pub fn subscribe(&self, callback: impl Fn(&CartView) + Send + Sync + 'static) -> Subscription {
        self.inner.subject.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<CartView> {
        self.inner.subject.watch()
    }

    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Records the added line and raises the notification. Runs inside the
    /// state update so the generation and the flag change together.
    fn announce(&self, view: &mut CartView, line: LastAdded) -> u64 {
        view.last_added = Some(line);
        view.show_notification = true;
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn reject_on_error<T>(&self, action: &'static str, result: CoreResult<T>) -> StoreResult<T> {
        result.map_err(|e| {
            debug!(action, error = %e, "Cart mutation rejected");
            StoreError::from(e)
        })
    }

    fn schedule_notification_clear(&self, generation: u64) {
        let inner = Arc::downgrade(&self.inner);
        let delay = self.inner.notification_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            inner.subject.update(|view| {
                // Re-checked under the state lock: an add may have landed
                // since the load above.
                if inner.generation.load(Ordering::SeqCst) == generation {
                    view.show_notification = false;
                }
            });
        });
    }

    /// Writes the latest cart snapshot. Failures are recorded, not returned.
    async fn persist(&self) {
        let _write = self.inner.persist_lock.lock().await;
        let key = self.inner.storage_key.as_str();
        let cart = self.cart();

        let result = match serde_json::to_vec(&cart) {
            Ok(bytes) => self.inner.persistence.set(key, bytes).await,
            Err(e) => Err(StoreError::from(e)),
        };

        match result {
            Ok(()) => {
                debug!(key, lines = cart.line_count(), "Cart persisted");
                if self.inner.subject.read(|view| view.persist_error.is_some()) {
                    self.inner.subject.update(|view| view.persist_error = None);
                }
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to persist cart");
                let message = e.to_string();
                self.inner
                    .subject
                    .update(|view| view.persist_error = Some(message));
            }
        }
    }
}

impl std::fmt::Debug for CartAggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartAggregationEngine")
            .field("storage_key", &self.inner.storage_key)
            .field("lines", &self.inner.subject.read(|view| view.cart.line_count()))
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;
    use crate::testing::FlakyPersistence;
    use menu_core::{SelectedOption, TaxRate};

    fn burger(quantity: i64) -> CartItem {
        CartItem::new("burger", "Burger", quantity, Money::from_cents(1000), vec![])
    }

    fn option(group: &str, name: &str, cents: i64) -> SelectedOption {
        SelectedOption {
            group: group.into(),
            name: name.into(),
            price: Money::from_cents(cents),
        }
    }

    fn engine() -> (CartAggregationEngine, Arc<MemoryPersistence>) {
        let persistence = Arc::new(MemoryPersistence::new("test"));
        let engine = CartAggregationEngine::new(persistence.clone(), &ClientConfig::default());
        (engine, persistence)
    }

    async fn stored(persistence: &MemoryPersistence) -> Option<ShoppingCart> {
        let bytes = persistence.get("shopping-cart").await.unwrap()?;
        Some(serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_add_item_merges_and_totals() {
        let (engine, _persistence) = engine();
        let cheese = option("extras", "cheese", 150);
        let bacon = option("extras", "bacon", 200);

        let first = CartItem::new("burger", "Burger", 1, Money::from_cents(1000), vec![cheese.clone(), bacon.clone()]);
        let second = CartItem::new("burger", "Burger", 2, Money::from_cents(1000), vec![bacon, cheese]);
        engine.add_item(first).await.unwrap();
        engine.add_item(second).await.unwrap();

        let cart = engine.cart();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].total_price.cents(), 4050);
        assert_eq!(cart.subtotal.cents(), 4050);
        assert_eq!(cart.taxes.cents(), 648);
        assert_eq!(cart.total.cents(), 4698);
        assert_eq!(cart.total_items, 3);
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let (engine, persistence) = engine();

        engine.add_item(burger(2)).await.unwrap();
        assert_eq!(stored(&persistence).await, Some(engine.cart()));

        engine
            .add_promotion(PromotionCartItem::new("combo", "Combo", 1, Money::from_cents(2000), Money::from_cents(500)))
            .await
            .unwrap();
        engine.update_quantity("burger", 5, None).await.unwrap();
        assert_eq!(stored(&persistence).await, Some(engine.cart()));
        assert_eq!(engine.cart().subtotal.cents(), 6500);

        engine.remove_promotion("combo").await;
        engine.set_discount(Money::from_cents(300)).await;
        assert_eq!(stored(&persistence).await, Some(engine.cart()));

        engine.clear().await;
        let cart = stored(&persistence).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_clears_after_delay() {
        let (engine, _persistence) = engine();

        engine.add_item(burger(1)).await.unwrap();
        let view = engine.view();
        assert!(view.show_notification);
        assert_eq!(view.last_added, Some(LastAdded::Item(engine.cart().items[0].clone())));

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert!(engine.view().show_notification);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        let view = engine.view();
        assert!(!view.show_notification);
        assert!(view.last_added.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_add_restarts_notification_delay() {
        let (engine, _persistence) = engine();

        engine.add_item(burger(1)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        engine
            .add_promotion(PromotionCartItem::new("combo", "Combo", 1, Money::from_cents(2000), Money::zero()))
            .await
            .unwrap();

        // First timer fires at 3s but the second add superseded it.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;
        assert!(engine.view().show_notification);
        assert!(matches!(engine.view().last_added, Some(LastAdded::Promotion(_))));

        tokio::time::sleep(Duration::from_millis(1600)).await;
        tokio::task::yield_now().await;
        assert!(!engine.view().show_notification);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_mutations_do_not_touch_notification() {
        let (engine, _persistence) = engine();

        engine.add_item(burger(1)).await.unwrap();
        engine.update_quantity("burger", 4, None).await.unwrap();
        assert!(engine.view().show_notification);

        engine.dismiss_notification();
        assert!(!engine.view().show_notification);
    }

    #[tokio::test]
    async fn test_restore_roundtrip_applies_configured_tax_rate() {
        let persistence = Arc::new(MemoryPersistence::new("test"));
        let first = CartAggregationEngine::new(persistence.clone(), &ClientConfig::default());
        first.add_item(burger(2)).await.unwrap();

        let mut config = ClientConfig::default();
        config.cart.tax_rate_bps = 800;
        let restored = CartAggregationEngine::restore(persistence, &config).await;

        let cart = restored.cart();
        assert_eq!(cart.items, first.cart().items);
        assert_eq!(cart.tax_rate, TaxRate::from_bps(800));
        assert_eq!(cart.taxes.cents(), 160);
        assert_eq!(cart.total.cents(), 2160);
        assert!(!restored.view().show_notification);
    }

    #[tokio::test]
    async fn test_restore_corrupt_snapshot_starts_empty() {
        let persistence = Arc::new(MemoryPersistence::new("test"));
        persistence.set("shopping-cart", b"{not json".to_vec()).await.unwrap();

        let engine = CartAggregationEngine::restore(persistence.clone(), &ClientConfig::default()).await;

        assert!(engine.cart().is_empty());
        engine.add_item(burger(1)).await.unwrap();
        assert_eq!(stored(&persistence).await, Some(engine.cart()));
    }

    #[tokio::test]
    async fn test_restore_absent_snapshot_starts_empty() {
        let persistence = Arc::new(MemoryPersistence::new("test"));
        let engine = CartAggregationEngine::restore(persistence, &ClientConfig::default()).await;
        assert_eq!(engine.cart().total, Money::zero());
        assert_eq!(engine.cart().tax_rate, TaxRate::from_bps(1600));
    }

    #[tokio::test]
    async fn test_persist_failure_is_recorded_not_returned() {
        let persistence = FlakyPersistence::new();
        let engine = CartAggregationEngine::new(persistence.clone(), &ClientConfig::default());

        persistence.set_failing(true);
        engine.add_item(burger(1)).await.unwrap();

        let view = engine.view();
        assert_eq!(view.cart.total_items, 1);
        assert!(view.persist_error.as_deref().unwrap().contains("quota"));

        persistence.set_failing(false);
        engine.add_item(burger(1)).await.unwrap();
        assert!(engine.view().persist_error.is_none());
        assert_eq!(engine.cart().items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_configured_line_limit() {
        let persistence = Arc::new(MemoryPersistence::new("test"));
        let mut config = ClientConfig::default();
        config.cart.max_lines = 2;
        let engine = CartAggregationEngine::new(persistence, &config);

        engine.add_item(burger(1)).await.unwrap();
        engine
            .add_item(CartItem::new("fries", "Fries", 1, Money::from_cents(400), vec![]))
            .await
            .unwrap();
        let err = engine
            .add_item(CartItem::new("soda", "Soda", 1, Money::from_cents(200), vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Cart(CoreError::CartTooLarge { max: 2 }));

        // Merging into an existing line is still allowed.
        engine.add_item(burger(1)).await.unwrap();
        assert_eq!(engine.cart().line_count(), 2);
    }

    #[tokio::test]
    async fn test_line_limit_never_exceeds_core_cap() {
        let persistence = Arc::new(MemoryPersistence::new("test"));
        let mut config = ClientConfig::default();
        config.cart.max_lines = MAX_CART_LINES + 50;
        let engine = CartAggregationEngine::new(persistence, &config);

        for i in 0..MAX_CART_LINES {
            let id = format!("dish-{i}");
            engine
                .add_item(CartItem::new(&id, "Dish", 1, Money::from_cents(100), vec![]))
                .await
                .unwrap();
        }
        let err = engine
            .add_item(CartItem::new("one-more", "Dish", 1, Money::from_cents(100), vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Cart(CoreError::CartTooLarge { max: MAX_CART_LINES }));
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_cart_unchanged() {
        let (engine, persistence) = engine();
        engine.add_item(burger(998)).await.unwrap();
        let before = engine.cart();

        let err = engine.add_item(burger(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Cart(CoreError::QuantityTooLarge { requested: 1000, .. })));

        let err = engine.update_quantity("ghost", 2, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Cart(CoreError::ItemNotInCart { .. })));

        assert_eq!(engine.cart(), before);
        assert_eq!(stored(&persistence).await, Some(before));
    }

    #[tokio::test]
    async fn test_remove_by_options_key() {
        let (engine, _persistence) = engine();
        let plain = burger(1);
        let cheesy = CartItem::new("burger", "Burger", 1, Money::from_cents(1000), vec![option("extras", "cheese", 150)]);
        let cheesy_key = cheesy.options_key();
        engine.add_item(plain).await.unwrap();
        engine.add_item(cheesy).await.unwrap();

        assert_eq!(engine.remove_item("burger", Some(&cheesy_key)).await, 1);
        assert_eq!(engine.cart().items.len(), 1);
        assert_eq!(engine.remove_item("burger", None).await, 1);
        assert!(engine.cart().is_empty());
        assert_eq!(engine.remove_item("burger", None).await, 0);
    }

    #[tokio::test]
    async fn test_drawer_state() {
        let (engine, persistence) = engine();

        engine.open_cart();
        assert!(engine.view().is_open);
        engine.toggle_cart();
        assert!(!engine.view().is_open);
        engine.toggle_cart();
        engine.close_cart();
        assert!(!engine.view().is_open);

        assert_eq!(stored(&persistence).await, None);
    }

    #[tokio::test]
    async fn test_watchers_see_totals() {
        let (engine, _persistence) = engine();
        let mut rx = engine.watch();

        engine.add_item(burger(3)).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().cart.subtotal.cents(), 3000);
    }
}
