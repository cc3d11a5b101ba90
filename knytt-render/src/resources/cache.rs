//! # Image Cache 模块
//!
//! 渲染前一次性预加载的图片缓存。
//!
//! 预加载阶段可变（`&mut self`），渲染阶段只读（`&self`），
//! 因此可以在多个线程之间直接共享。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use tracing::{debug, warn};

use super::{ResourceKind, ResourceResolver};

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 已加载的图片数
    pub loaded: usize,
    /// 缺失或无法解码的资源数
    pub missing: usize,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数（请求了缺失的资源）
    pub misses: u64,
}

/// 图片缓存
#[derive(Debug, Default)]
pub struct ImageCache {
    /// 资源 -> 图片
    images: HashMap<ResourceKind, Arc<RgbaImage>>,
    /// 已确认缺失的资源
    missing: BTreeSet<ResourceKind>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预加载资源
    ///
    /// 每个缺失或损坏的资源只记录一次警告。
    pub fn preload<I>(&mut self, resolver: &ResourceResolver, kinds: I)
    where
        I: IntoIterator<Item = ResourceKind>,
    {
        for kind in kinds {
            if self.images.contains_key(&kind) || self.missing.contains(&kind) {
                continue;
            }

            match resolver.load_image(&kind) {
                Ok(Some(img)) => {
                    debug!(resource = %kind, path = %kind.logical_path(), "图片加载成功");
                    self.images.insert(kind, Arc::new(img));
                }
                Ok(None) => {
                    warn!(resource = %kind, path = %kind.logical_path(), "资源缺失，跳过绘制");
                    self.missing.insert(kind);
                }
                Err(e) => {
                    warn!(resource = %kind, error = %e, "资源加载失败，跳过绘制");
                    self.missing.insert(kind);
                }
            }
        }
    }

    /// 直接放入图片
    pub fn insert(&mut self, kind: ResourceKind, img: RgbaImage) {
        self.missing.remove(&kind);
        self.images.insert(kind, Arc::new(img));
    }

    /// 获取图片
    pub fn get(&self, kind: &ResourceKind) -> Option<&RgbaImage> {
        match self.images.get(kind) {
            Some(img) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(img.as_ref())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn contains(&self, kind: &ResourceKind) -> bool {
        self.images.contains_key(kind)
    }

    /// 已确认缺失的资源（有序）
    pub fn missing(&self) -> impl Iterator<Item = &ResourceKind> {
        self.missing.iter()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            loaded: self.images.len(),
            missing: self.missing.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::write_png;

    #[test]
    fn test_preload_and_stats() {
        let shared = tempfile::tempdir().unwrap();
        write_png(shared.path(), "Tilesets/Tileset1.png", 384, 192, [0, 0, 0, 255]);
        let resolver = ResourceResolver::from_dirs(shared.path(), shared.path());

        let mut cache = ImageCache::new();
        cache.preload(
            &resolver,
            [
                ResourceKind::Tileset(1),
                ResourceKind::Tileset(2),
                ResourceKind::Tileset(1),
            ],
        );

        assert!(cache.contains(&ResourceKind::Tileset(1)));
        assert_eq!(cache.missing().collect::<Vec<_>>(), vec![&ResourceKind::Tileset(2)]);

        assert!(cache.get(&ResourceKind::Tileset(1)).is_some());
        assert!(cache.get(&ResourceKind::Tileset(2)).is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                loaded: 1,
                missing: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_insert_clears_missing() {
        let mut cache = ImageCache::new();
        let resolver = ResourceResolver::from_dirs("no-such-root", "no-such-root");
        cache.preload(&resolver, [ResourceKind::Gradient(1)]);
        assert_eq!(cache.stats().missing, 1);

        cache.insert(ResourceKind::Gradient(1), RgbaImage::new(1, 1));
        assert_eq!(cache.stats().missing, 0);
        assert!(cache.get(&ResourceKind::Gradient(1)).is_some());
    }
}
