//! # Resources 模块
//!
//! 资源定位与加载。
//!
//! ## 两个搜索根
//!
//! - **共享资源根**：游戏自带的 `Gradients/`、`Tilesets/`、`Objects/BankN/`
//! - **世界资源根**：世界自己的目录（解包目录或归档本身），存放 `Custom Objects/`
//!   以及覆盖共享资源的自定义渐变/图块集
//!
//! [`ResourceResolver::resolve`] 只回答“在哪里”，找不到时返回
//! [`Resolution::Missing`]，是否记录日志、跳过或中止由调用方决定。

mod cache;
mod error;
pub mod path;
mod source;

pub use cache::{CacheStats, ImageCache};
pub use error::ResourceError;
pub use source::{ArchiveSource, FsSource, ResourceSource};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;

/// 逻辑资源
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// 背景渐变
    Gradient(u8),
    /// 图块集
    Tileset(u8),
    /// 标准物件
    Object { bank: u8, id: u8 },
    /// 自定义物件图片（文件名）
    Custom(String),
}

impl ResourceKind {
    /// 在资源根下的逻辑路径
    pub fn logical_path(&self) -> String {
        match self {
            ResourceKind::Gradient(id) => format!("Gradients/Gradient{id}.png"),
            ResourceKind::Tileset(id) => format!("Tilesets/Tileset{id}.png"),
            ResourceKind::Object { bank, id } => format!("Objects/Bank{bank}/Object{id}.png"),
            ResourceKind::Custom(name) => format!("Custom Objects/{name}"),
        }
    }

    /// 依次搜索的根
    fn search_roots(&self) -> &'static [Root] {
        match self {
            ResourceKind::Gradient(_) | ResourceKind::Tileset(_) => &[Root::World, Root::Shared],
            ResourceKind::Object { .. } => &[Root::Shared],
            ResourceKind::Custom(_) => &[Root::World],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Gradient(id) => write!(f, "gradient {id}"),
            ResourceKind::Tileset(id) => write!(f, "tileset {id}"),
            ResourceKind::Object { bank, id } => write!(f, "object {bank}/{id}"),
            ResourceKind::Custom(name) => write!(f, "custom object '{name}'"),
        }
    }
}

/// 搜索根
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Shared,
    World,
}

/// 定位到的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    pub root: Root,
    pub path: String,
}

/// 定位结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedResource),
    Missing,
}

/// 资源定位器
#[derive(Clone)]
pub struct ResourceResolver {
    shared: Arc<dyn ResourceSource>,
    world: Arc<dyn ResourceSource>,
}

impl ResourceResolver {
    pub fn new(shared: Arc<dyn ResourceSource>, world: Arc<dyn ResourceSource>) -> Self {
        Self { shared, world }
    }

    /// 两个根都在文件系统上
    pub fn from_dirs(shared_root: impl Into<PathBuf>, world_root: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(FsSource::new(shared_root)),
            Arc::new(FsSource::new(world_root)),
        )
    }

    fn source(&self, root: Root) -> &dyn ResourceSource {
        match root {
            Root::Shared => self.shared.as_ref(),
            Root::World => self.world.as_ref(),
        }
    }

    /// 定位资源
    pub fn resolve(&self, kind: &ResourceKind) -> Resolution {
        let path = kind.logical_path();
        kind.search_roots()
            .iter()
            .find(|&&root| self.source(root).exists(&path))
            .map(|&root| {
                Resolution::Found(ResolvedResource {
                    root,
                    path: path.clone(),
                })
            })
            .unwrap_or(Resolution::Missing)
    }

    /// 读取已定位资源的字节
    pub fn read(&self, resource: &ResolvedResource) -> Result<Vec<u8>, ResourceError> {
        self.source(resource.root).read(&resource.path)
    }

    /// 完整路径（用于日志）
    pub fn full_path(&self, resource: &ResolvedResource) -> String {
        self.source(resource.root).full_path(&resource.path)
    }

    /// 定位并解码图片
    ///
    /// 找不到返回 `Ok(None)`；找到但读取或解码失败返回错误。
    pub fn load_image(&self, kind: &ResourceKind) -> Result<Option<RgbaImage>, ResourceError> {
        let Resolution::Found(resource) = self.resolve(kind) else {
            return Ok(None);
        };

        let bytes = self.read(&resource)?;
        let img = image::load_from_memory(&bytes).map_err(|e| ResourceError::InvalidImage {
            path: self.full_path(&resource),
            message: e.to_string(),
        })?;
        Ok(Some(img.to_rgba8()))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_png;
    use super::*;

    #[test]
    fn test_logical_paths() {
        assert_eq!(ResourceKind::Gradient(3).logical_path(), "Gradients/Gradient3.png");
        assert_eq!(ResourceKind::Tileset(12).logical_path(), "Tilesets/Tileset12.png");
        assert_eq!(
            ResourceKind::Object { bank: 15, id: 2 }.logical_path(),
            "Objects/Bank15/Object2.png"
        );
        assert_eq!(
            ResourceKind::Custom("Eye.png".to_string()).logical_path(),
            "Custom Objects/Eye.png"
        );
    }

    #[test]
    fn test_resolution_order() {
        let shared = tempfile::tempdir().unwrap();
        let world = tempfile::tempdir().unwrap();
        write_png(shared.path(), "Tilesets/Tileset1.png", 1, 1, [1, 1, 1, 255]);
        write_png(shared.path(), "Tilesets/Tileset2.png", 1, 1, [2, 2, 2, 255]);
        write_png(world.path(), "Tilesets/Tileset2.png", 1, 1, [9, 9, 9, 255]);
        write_png(world.path(), "Custom Objects/Eye.png", 1, 1, [0, 0, 0, 255]);
        // 物件只在共享根查找
        write_png(world.path(), "Objects/Bank0/Object1.png", 1, 1, [0, 0, 0, 255]);

        let resolver = ResourceResolver::from_dirs(shared.path(), world.path());

        let found = |root, path: &str| {
            Resolution::Found(ResolvedResource {
                root,
                path: path.to_string(),
            })
        };
        assert_eq!(
            resolver.resolve(&ResourceKind::Tileset(1)),
            found(Root::Shared, "Tilesets/Tileset1.png")
        );
        assert_eq!(
            resolver.resolve(&ResourceKind::Tileset(2)),
            found(Root::World, "Tilesets/Tileset2.png")
        );
        assert_eq!(
            resolver.resolve(&ResourceKind::Custom("Eye.png".into())),
            found(Root::World, "Custom Objects/Eye.png")
        );
        assert_eq!(
            resolver.resolve(&ResourceKind::Object { bank: 0, id: 1 }),
            Resolution::Missing
        );
        assert_eq!(resolver.resolve(&ResourceKind::Gradient(0)), Resolution::Missing);
    }

    #[test]
    fn test_load_image() {
        let shared = tempfile::tempdir().unwrap();
        write_png(shared.path(), "Gradients/Gradient1.png", 2, 3, [10, 20, 30, 255]);
        std::fs::create_dir_all(shared.path().join("Gradients")).unwrap();
        std::fs::write(shared.path().join("Gradients/Gradient2.png"), b"not a png").unwrap();

        let resolver = ResourceResolver::from_dirs(shared.path(), shared.path().join("none"));

        let img = resolver.load_image(&ResourceKind::Gradient(1)).unwrap().unwrap();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.get_pixel(1, 2).0, [10, 20, 30, 255]);

        assert_eq!(resolver.load_image(&ResourceKind::Gradient(5)).unwrap(), None);
        assert!(matches!(
            resolver.load_image(&ResourceKind::Gradient(2)),
            Err(ResourceError::InvalidImage { .. })
        ));
    }
}
