use std::num::NonZeroUsize;

use lru::LruCache;
use lyon::tessellation::VertexBuffers;

use crate::geometry::Rect;
use crate::pointer::AreaKind;

/// Tessellated outline of an area shape, in target pixels.
pub(super) type ShapeBuffers = VertexBuffers<[f32; 2], u16>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct ShapeKey {
    kind: AreaKind,
    bounds: [i32; 4],
}

impl ShapeKey {
    pub(super) fn new(kind: AreaKind, rect: &Rect) -> Self {
        Self {
            kind,
            bounds: [rect.min.x, rect.min.y, rect.max.x, rect.max.y],
        }
    }
}

pub(super) struct Cache {
    tessellation_cache: LruCache<ShapeKey, ShapeBuffers, ahash::RandomState>,
}

impl Cache {
    pub(super) fn new(size: NonZeroUsize) -> Self {
        Self {
            tessellation_cache: LruCache::with_hasher(size, ahash::RandomState::new()),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.tessellation_cache.len()
    }

    #[cfg(test)]
    fn contains(&self, key: &ShapeKey) -> bool {
        self.tessellation_cache.contains(key)
    }

    /// Cached buffers for `key`, tessellating them with `tessellate` on a miss.
    pub(super) fn get_or_tessellate<E>(
        &mut self,
        key: ShapeKey,
        tessellate: impl FnOnce() -> Result<ShapeBuffers, E>,
    ) -> Result<&ShapeBuffers, E> {
        self.tessellation_cache.try_get_or_insert(key, tessellate)
    }

    pub(super) fn clear(&mut self) {
        self.tessellation_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect;

    fn buffers(n: u16) -> Result<ShapeBuffers, ()> {
        let mut buffers = ShapeBuffers::new();
        buffers.vertices.push([n as f32, 0.0]);
        buffers.indices.push(n);
        Ok(buffers)
    }

    #[test]
    fn least_recently_used_shape_is_evicted() {
        let mut cache = Cache::new(NonZeroUsize::new(2).unwrap());
        let a = ShapeKey::new(AreaKind::Rect, &rect(0, 0, 1, 1));
        let b = ShapeKey::new(AreaKind::Ellipse, &rect(0, 0, 1, 1));
        let c = ShapeKey::new(AreaKind::Rect, &rect(0, 0, 2, 2));

        cache.get_or_tessellate(a, || buffers(1)).unwrap();
        cache.get_or_tessellate(b, || buffers(2)).unwrap();
        cache.get_or_tessellate(a, || buffers(9)).unwrap();
        cache.get_or_tessellate(c, || buffers(3)).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&b));
        let cached = cache.get_or_tessellate(a, || buffers(9)).unwrap();
        assert_eq!(cached.indices, [1]);
    }

    #[test]
    fn failed_tessellation_is_not_cached() {
        let mut cache = Cache::new(NonZeroUsize::new(4).unwrap());
        let key = ShapeKey::new(AreaKind::Rect, &rect(0, 0, 1, 1));
        assert!(cache.get_or_tessellate(key, || Err(())).is_err());
        assert!(!cache.contains(&key));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn shape_kind_is_part_of_the_key() {
        let r = rect(0, 0, 4, 4);
        assert_ne!(
            ShapeKey::new(AreaKind::Rect, &r),
            ShapeKey::new(AreaKind::Ellipse, &r)
        );
    }
}
