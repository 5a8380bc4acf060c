//! # Store Registry
//!
//! Builds every store exactly once and hands them to consumers.
//!
//! ```text
//!   MenuClients ──┐
//!   persistence ──┼──► MenuStores::new ──► restaurants, categories
//!   ClientConfig ─┘                        dishes + dish_order
//!                                          hero_slides + hero_slide_order
//!                                          favorites, cart
//! ```

use std::sync::Arc;

use menu_core::{Category, Dish, Favorite, HeroSlide, Restaurant};
use tracing::info;

use crate::cache::{Clock, SystemClock};
use crate::cart::CartAggregationEngine;
use crate::client::{RemoteResourceClient, ReorderClient};
use crate::config::ClientConfig;
use crate::favorites::FavoriteStore;
use crate::persistence::PersistenceAdapter;
use crate::reorder::PositionReorderController;
use crate::resource::Resource;
use crate::store::ResourceStore;

/// One injected remote client per resource.
#[derive(Clone)]
pub struct MenuClients {
    pub restaurants: Arc<dyn RemoteResourceClient<Restaurant>>,
    pub categories: Arc<dyn RemoteResourceClient<Category>>,
    pub dishes: Arc<dyn RemoteResourceClient<Dish>>,
    pub dish_order: Arc<dyn ReorderClient<Dish>>,
    pub hero_slides: Arc<dyn RemoteResourceClient<HeroSlide>>,
    pub hero_slide_order: Arc<dyn ReorderClient<HeroSlide>>,
    pub favorites: Arc<dyn RemoteResourceClient<Favorite>>,
}

/// All client-side state of the menu application.
#[derive(Debug)]
pub struct MenuStores {
    pub restaurants: Arc<ResourceStore<Restaurant>>,
    pub categories: Arc<ResourceStore<Category>>,
    pub dishes: Arc<ResourceStore<Dish>>,
    pub dish_order: PositionReorderController<Dish>,
    pub hero_slides: Arc<ResourceStore<HeroSlide>>,
    pub hero_slide_order: PositionReorderController<HeroSlide>,
    pub favorites: FavoriteStore,
    pub cart: CartAggregationEngine,
}

impl MenuStores {
    /// Builds every store and restores the cart from `persistence`.
    pub async fn new(
        clients: MenuClients,
        persistence: Arc<dyn PersistenceAdapter>,
        config: &ClientConfig,
    ) -> Self {
        Self::with_clock(clients, persistence, config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        clients: MenuClients,
        persistence: Arc<dyn PersistenceAdapter>,
        config: &ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dishes = build(clients.dishes, config, &clock);
        let hero_slides = build(clients.hero_slides, config, &clock);

        let stores = MenuStores {
            restaurants: build(clients.restaurants, config, &clock),
            categories: build(clients.categories, config, &clock),
            dish_order: PositionReorderController::new(Arc::clone(&dishes), clients.dish_order),
            dishes,
            hero_slide_order: PositionReorderController::new(
                Arc::clone(&hero_slides),
                clients.hero_slide_order,
            ),
            hero_slides,
            favorites: FavoriteStore::new(build(clients.favorites, config, &clock)),
            cart: CartAggregationEngine::restore(persistence, config).await,
        };

        info!(
            default_ttl_secs = config.cache.default_ttl_secs,
            high_churn_ttl_secs = config.cache.high_churn_ttl_secs,
            cart_lines = stores.cart.cart().line_count(),
            "Menu stores ready"
        );
        stores
    }

    /// Drops all session-scoped state. Catalog caches and the cart stay.
    pub fn on_logout(&self) {
        self.favorites.store().clear_cache();
        info!("Session-scoped stores cleared");
    }
}

fn build<R: Resource>(
    client: Arc<dyn RemoteResourceClient<R>>,
    config: &ClientConfig,
    clock: &Arc<dyn Clock>,
) -> Arc<ResourceStore<R>> {
    Arc::new(ResourceStore::with_clock(
        client,
        config.ttl_for(R::KIND),
        Arc::clone(clock),
    ))
}
