//! `RendererCache`: fingerprint→artifact LRU that integrates
//! with the positioner. Before a mount, the positioner
//! asks this cache; on hit it reuses the artifact, on miss it invokes the
//! host's `Renderer` and inserts the result.

use crate::cache::{CacheStats, LRUCache};
use crate::cell::{Cell, CellFingerprint, ColId};
use crate::error::ConfigError;
use crate::row_source::Renderer;

pub const DEFAULT_CAPACITY: usize = 1000;

pub struct RendererCache<A> {
    cache: LRUCache<CellFingerprint, A>,
}

impl<A> RendererCache<A> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Ok(RendererCache {
            cache: LRUCache::new(capacity)?,
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns the cached artifact for `fingerprint`, rendering and
    /// inserting it via `renderer` on a miss.
    pub fn get_or_render<R>(
        &mut self,
        fingerprint: CellFingerprint,
        renderer: &mut R,
        cell: &Cell,
        col: ColId,
    ) -> &A
    where
        R: Renderer<Artifact = A>,
    {
        // `get` records the hit/miss for this lookup exactly once; a miss
        // then renders and inserts, a hit short-circuits. The final
        // retrieval uses `peek` so it doesn't record a second, spurious
        // hit on top of the one `get` already counted.
        let hit = self.cache.get(&fingerprint).is_some();
        if !hit {
            let artifact = renderer.render(cell, col, &fingerprint);
            self.cache.put(fingerprint.clone(), artifact);
        }
        self.cache
            .peek(&fingerprint)
            .expect("just confirmed present, or just inserted")
    }

    pub fn invalidate(&mut self, fingerprint: &CellFingerprint) {
        self.cache.remove(fingerprint);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
