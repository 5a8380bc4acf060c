//! Scripted fakes shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use menu_core::{
    Category, CategoryDraft, CategoryPatch, Dish, DishDraft, DishPatch, Favorite, FavoriteDraft,
    HeroSlide, HeroSlideDraft, HeroSlidePatch, Money, PositionUpdate, Restaurant, RestaurantDraft,
    RestaurantPatch,
};
use tokio::sync::Notify;

use crate::client::{RemoteError, RemoteResourceClient, RemoteResult, ReorderClient};
use crate::error::{StoreError, StoreResult};
use crate::persistence::{MemoryPersistence, PersistenceAdapter};
use crate::resource::{Orderable, Resource};
use crate::subject::lock;

/// Remote calls a [`FakeClient`] can be scripted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Call {
    List,
    Get,
    Create,
    Update,
    Delete,
    Reorder,
}

#[derive(Default)]
struct Script {
    calls: HashMap<Call, usize>,
    fail: HashSet<Call>,
    panic: HashSet<Call>,
    hang: HashSet<Call>,
    gates: HashMap<Call, Arc<Notify>>,
    reorders: Vec<Vec<PositionUpdate>>,
}

type MakeFn<R> = Box<dyn Fn(&<R as Resource>::Draft, usize) -> R + Send + Sync>;
type ApplyFn<R> = Box<dyn Fn(&mut R, &<R as Resource>::Patch) + Send + Sync>;

/// In-memory server for one resource.
///
/// Every scripted behavior (`fail_next`, `panic_next`, `hang_next`, `gate`)
/// applies to the next call of that kind only.
pub(crate) struct FakeClient<R: Resource> {
    items: Mutex<Vec<R>>,
    script: Mutex<Script>,
    make: MakeFn<R>,
    apply: ApplyFn<R>,
}

impl<R: Resource> FakeClient<R> {
    pub(crate) fn new(
        items: Vec<R>,
        make: impl Fn(&R::Draft, usize) -> R + Send + Sync + 'static,
        apply: impl Fn(&mut R, &R::Patch) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(FakeClient {
            items: Mutex::new(items),
            script: Mutex::new(Script::default()),
            make: Box::new(make),
            apply: Box::new(apply),
        })
    }

    pub(crate) fn calls(&self, call: Call) -> usize {
        lock(&self.script).calls.get(&call).copied().unwrap_or(0)
    }

    pub(crate) fn fail_next(&self, call: Call) {
        lock(&self.script).fail.insert(call);
    }

    pub(crate) fn panic_next(&self, call: Call) {
        lock(&self.script).panic.insert(call);
    }

    pub(crate) fn hang_next(&self, call: Call) {
        lock(&self.script).hang.insert(call);
    }

    /// The next call of this kind waits until the returned handle is
    /// notified.
    pub(crate) fn gate(&self, call: Call) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.script).gates.insert(call, Arc::clone(&notify));
        notify
    }

    pub(crate) fn reorders(&self) -> Vec<Vec<PositionUpdate>> {
        lock(&self.script).reorders.clone()
    }

    pub(crate) fn insert(&self, item: R) {
        lock(&self.items).push(item);
    }

    pub(crate) fn remove(&self, id: &str) {
        lock(&self.items).retain(|r| r.id() != id);
    }

    pub(crate) fn server_items(&self) -> Vec<R> {
        lock(&self.items).clone()
    }

    async fn enter(&self, call: Call) -> RemoteResult<()> {
        let (gate, panic, hang, fail) = {
            let mut script = lock(&self.script);
            *script.calls.entry(call).or_default() += 1;
            (
                script.gates.remove(&call),
                script.panic.remove(&call),
                script.hang.remove(&call),
                script.fail.remove(&call),
            )
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }
        if panic {
            panic!("scripted panic in {call:?}");
        }
        if hang {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(RemoteError::Network(format!("scripted {call:?} failure")));
        }
        Ok(())
    }

    fn not_found(id: &str) -> RemoteError {
        RemoteError::Rejected {
            status: 404,
            message: format!("{} {id} not found", R::KIND),
        }
    }
}

#[async_trait]
impl<R: Resource> RemoteResourceClient<R> for FakeClient<R> {
    async fn list(&self, _filter: &R::Filter) -> RemoteResult<Vec<R>> {
        self.enter(Call::List).await?;
        Ok(lock(&self.items).clone())
    }

    async fn get(&self, id: &str) -> RemoteResult<R> {
        self.enter(Call::Get).await?;
        lock(&self.items)
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: &R::Draft) -> RemoteResult<R> {
        self.enter(Call::Create).await?;
        let created = (self.make)(draft, self.calls(Call::Create));
        lock(&self.items).push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> RemoteResult<R> {
        self.enter(Call::Update).await?;
        let mut items = lock(&self.items);
        let item = items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        (self.apply)(item, patch);
        Ok(item.clone())
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        self.enter(Call::Delete).await?;
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|r| r.id() != id);
        if items.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Orderable> ReorderClient<R> for FakeClient<R> {
    async fn reorder_bulk(&self, positions: &[PositionUpdate]) -> RemoteResult<()> {
        self.enter(Call::Reorder).await?;
        lock(&self.script).reorders.push(positions.to_vec());
        let mut items = lock(&self.items);
        for update in positions {
            if let Some(item) = items.iter_mut().find(|r| r.id() == update.id) {
                item.set_position(update.new_position);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn dish(id: &str, category_id: &str, position: i64) -> Dish {
    Dish {
        id: id.to_string(),
        restaurant_id: "r1".to_string(),
        category_id: category_id.to_string(),
        name: format!("Dish {id}"),
        description: None,
        price: Money::from_cents(1000),
        image_url: None,
        is_available: true,
        position,
        options: vec![],
    }
}

pub(crate) fn dish_draft(name: &str, category_id: &str, price_cents: i64) -> DishDraft {
    DishDraft {
        restaurant_id: "r1".to_string(),
        category_id: category_id.to_string(),
        name: name.to_string(),
        description: None,
        price: Money::from_cents(price_cents),
        image_url: None,
        options: vec![],
    }
}

pub(crate) fn dish_client(items: Vec<Dish>) -> Arc<FakeClient<Dish>> {
    FakeClient::new(
        items,
        |draft: &DishDraft, n| Dish {
            id: format!("dish-new-{n}"),
            restaurant_id: draft.restaurant_id.clone(),
            category_id: draft.category_id.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            image_url: draft.image_url.clone(),
            is_available: true,
            position: 0,
            options: draft.options.clone(),
        },
        |dish: &mut Dish, patch: &DishPatch| {
            if let Some(ref name) = patch.name {
                dish.name = name.clone();
            }
            if let Some(price) = patch.price {
                dish.price = price;
            }
            if let Some(ref category_id) = patch.category_id {
                dish.category_id = category_id.clone();
            }
            if let Some(available) = patch.is_available {
                dish.is_available = available;
            }
        },
    )
}

pub(crate) fn hero_slide(id: &str, restaurant_id: &str, position: i64) -> HeroSlide {
    HeroSlide {
        id: id.to_string(),
        restaurant_id: restaurant_id.to_string(),
        title: format!("Slide {id}"),
        subtitle: None,
        image_url: format!("https://cdn.example.com/{id}.jpg"),
        link_url: None,
        position,
        is_active: true,
    }
}

pub(crate) fn hero_slide_client(items: Vec<HeroSlide>) -> Arc<FakeClient<HeroSlide>> {
    FakeClient::new(
        items,
        |draft: &HeroSlideDraft, n| HeroSlide {
            id: format!("slide-new-{n}"),
            restaurant_id: draft.restaurant_id.clone(),
            title: draft.title.clone(),
            subtitle: draft.subtitle.clone(),
            image_url: draft.image_url.clone(),
            link_url: draft.link_url.clone(),
            position: 0,
            is_active: true,
        },
        |slide: &mut HeroSlide, patch: &HeroSlidePatch| {
            if let Some(ref title) = patch.title {
                slide.title = title.clone();
            }
        },
    )
}

pub(crate) fn restaurant(id: &str) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: format!("Restaurant {id}"),
        slug: id.to_string(),
        description: None,
        logo_url: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn restaurant_client(items: Vec<Restaurant>) -> Arc<FakeClient<Restaurant>> {
    FakeClient::new(
        items,
        |draft: &RestaurantDraft, n| Restaurant {
            id: format!("restaurant-new-{n}"),
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            description: draft.description.clone(),
            logo_url: draft.logo_url.clone(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        |restaurant: &mut Restaurant, patch: &RestaurantPatch| {
            if let Some(ref name) = patch.name {
                restaurant.name = name.clone();
            }
        },
    )
}

pub(crate) fn category_client(items: Vec<Category>) -> Arc<FakeClient<Category>> {
    FakeClient::new(
        items,
        |draft: &CategoryDraft, n| Category {
            id: format!("category-new-{n}"),
            restaurant_id: draft.restaurant_id.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            is_active: true,
        },
        |category: &mut Category, patch: &CategoryPatch| {
            if let Some(ref name) = patch.name {
                category.name = name.clone();
            }
        },
    )
}

pub(crate) fn favorite(id: &str, restaurant_id: &str) -> Favorite {
    Favorite {
        id: id.to_string(),
        restaurant_id: restaurant_id.to_string(),
        created_at: Utc::now(),
    }
}

pub(crate) fn favorite_client(items: Vec<Favorite>) -> Arc<FakeClient<Favorite>> {
    FakeClient::new(
        items,
        |draft: &FavoriteDraft, n| Favorite {
            id: format!("fav-{n}"),
            restaurant_id: draft.restaurant_id.clone(),
            created_at: Utc::now(),
        },
        |_: &mut Favorite, _: &()| {},
    )
}

// =============================================================================
// Persistence
// =============================================================================

/// Memory persistence whose writes can be made to fail.
pub(crate) struct FlakyPersistence {
    inner: MemoryPersistence,
    fail_writes: AtomicBool,
}

impl FlakyPersistence {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(FlakyPersistence {
            inner: MemoryPersistence::new("test"),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceAdapter for FlakyPersistence {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence("storage quota exceeded".into()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key).await
    }
}
