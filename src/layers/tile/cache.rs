use super::loader::TileImage;
use crate::core::geo::TileCoord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
pub enum TileState {
    Loading,
    Ready(Arc<TileImage>),
    /// Download or decode failed; not retried while cached
    Failed,
}

/// LRU of tile states for one layer
#[derive(Debug)]
pub struct TileCache {
    tiles: LruCache<TileCoord, TileState>,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
        Self {
            tiles: LruCache::new(capacity),
        }
    }

    /// Looks a tile up and marks it recently used
    pub fn get(&mut self, coord: &TileCoord) -> Option<&TileState> {
        self.tiles.get(coord)
    }

    pub fn ready(&mut self, coord: &TileCoord) -> Option<Arc<TileImage>> {
        match self.tiles.get(coord) {
            Some(TileState::Ready(image)) => Some(image.clone()),
            _ => None,
        }
    }

    pub fn mark_loading(&mut self, coord: TileCoord) {
        self.tiles.put(coord, TileState::Loading);
    }

    pub fn insert(&mut self, coord: TileCoord, image: TileImage) {
        self.tiles.put(coord, TileState::Ready(Arc::new(image)));
    }

    pub fn mark_failed(&mut self, coord: TileCoord) {
        self.tiles.put(coord, TileState::Failed);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(crate::core::constants::DEFAULT_TILE_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> TileImage {
        TileImage {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 255],
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut cache = TileCache::new(4);
        let coord = TileCoord::new(1, 1, 2);
        assert!(cache.get(&coord).is_none());

        cache.mark_loading(coord);
        assert!(matches!(cache.get(&coord), Some(TileState::Loading)));
        assert!(cache.ready(&coord).is_none());

        cache.insert(coord, image());
        assert!(cache.ready(&coord).is_some());

        cache.mark_failed(coord);
        assert!(matches!(cache.get(&coord), Some(TileState::Failed)));
    }

    #[test]
    fn test_least_recently_used_evicted() {
        let mut cache = TileCache::new(2);
        let a = TileCoord::new(0, 0, 1);
        let b = TileCoord::new(1, 0, 1);
        let c = TileCoord::new(0, 1, 1);
        cache.insert(a, image());
        cache.insert(b, image());
        cache.get(&a);
        cache.insert(c, image());

        assert_eq!(cache.len(), 2);
        assert!(cache.ready(&a).is_some());
        assert!(cache.get(&b).is_none());
    }

    #[test]
    fn test_zero_capacity_falls_back() {
        let mut cache = TileCache::new(0);
        cache.insert(TileCoord::new(0, 0, 0), image());
        assert_eq!(cache.len(), 1);
    }
}
