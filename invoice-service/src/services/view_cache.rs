//! In-process cache of rendered dashboard views.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache of rendered page bodies keyed by path. Mutations call
/// [`ViewCache::invalidate`] so the next read recomputes the view.
///
/// Writers observe a per-path generation before rendering and hand it back
/// to [`ViewCache::put`]; a body rendered before an intervening
/// invalidation is discarded instead of resurrecting stale data.
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn get(&self, path: &str) -> Option<Value>;
    /// Current generation for `path`; bumped by every invalidation.
    async fn generation(&self, path: &str) -> u64;
    /// Store a body rendered while `generation` was current. No-op if the
    /// path has been invalidated since.
    async fn put(&self, path: &str, generation: u64, body: Value);
    async fn invalidate(&self, path: &str);
}

#[derive(Default)]
struct Slot {
    generation: u64,
    body: Option<Value>,
}

/// Default in-memory implementation.
#[derive(Default)]
pub struct InMemoryViewCache {
    slots: RwLock<HashMap<String, Slot>>,
}

#[async_trait]
impl ViewCache for InMemoryViewCache {
    async fn get(&self, path: &str) -> Option<Value> {
        self.slots
            .read()
            .await
            .get(path)
            .and_then(|slot| slot.body.clone())
    }

    async fn generation(&self, path: &str) -> u64 {
        self.slots
            .read()
            .await
            .get(path)
            .map(|slot| slot.generation)
            .unwrap_or(0)
    }

    async fn put(&self, path: &str, generation: u64, body: Value) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(path.to_string()).or_default();
        if slot.generation == generation {
            slot.body = Some(body);
        } else {
            debug!(path, "Discarding stale view render");
        }
    }

    async fn invalidate(&self, path: &str) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(path.to_string()).or_default();
        slot.generation += 1;
        if slot.body.take().is_some() {
            debug!(path, "View cache entry invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_with_current_generation_is_visible() {
        let cache = InMemoryViewCache::default();
        let generation = cache.generation("/a").await;
        cache.put("/a", generation, json!([1])).await;
        assert_eq!(cache.get("/a").await, Some(json!([1])));
    }

    #[tokio::test]
    async fn invalidate_drops_entry_and_bumps_generation() {
        let cache = InMemoryViewCache::default();
        let generation = cache.generation("/a").await;
        cache.put("/a", generation, json!([1])).await;

        cache.invalidate("/a").await;
        assert_eq!(cache.get("/a").await, None);
        assert_eq!(cache.generation("/a").await, generation + 1);
    }

    #[tokio::test]
    async fn render_started_before_invalidation_is_discarded() {
        let cache = InMemoryViewCache::default();

        // Reader observes the generation, then a mutation invalidates
        // before the reader finishes rendering.
        let observed = cache.generation("/a").await;
        cache.invalidate("/a").await;

        cache.put("/a", observed, json!(["stale"])).await;
        assert_eq!(cache.get("/a").await, None);

        // The next reader, with the fresh generation, succeeds.
        let fresh = cache.generation("/a").await;
        cache.put("/a", fresh, json!(["fresh"])).await;
        assert_eq!(cache.get("/a").await, Some(json!(["fresh"])));
    }
}
