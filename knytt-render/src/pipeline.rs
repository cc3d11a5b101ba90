//! # Pipeline 模块
//!
//! 从归档到拼图 PNG 的完整流程：
//!
//! ```text
//! 打开归档 → (解包) → 解码 Map.bin / World.ini → 预加载资源
//!         → 并行合成屏幕 → 拼图 → 写出 PNG
//! ```
//!
//! 任何一步失败都返回带阶段信息的 [`PipelineError`]；
//! 单个资源缺失不算失败，只跳过对应元素。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use knytt_format::layout::{self, MAP_FILE, WORLD_INI};
use knytt_format::{ArchiveError, ArchiveReader, LayoutError, World, WorldBounds, WorldIni};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compositor::{ScreenCompositor, WorldCompositor};
use crate::config::{ConfigError, RenderConfig};
use crate::resources::path::output_file_name;
use crate::resources::{
    ArchiveSource, CacheStats, FsSource, ImageCache, ResourceKind, ResourceResolver, ResourceSource,
};

/// 输出文件名中的时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 流程错误
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("配置无效: {0}")]
    Config(#[from] ConfigError),

    #[error("读取归档 {archive} 失败: {source}")]
    Archive {
        archive: String,
        #[source]
        source: ArchiveError,
    },

    #[error("解包归档 {archive} 失败: {source}")]
    Extract {
        archive: String,
        #[source]
        source: ArchiveError,
    },

    #[error("归档 {archive} 中没有 {MAP_FILE}")]
    MapNotFound { archive: String },

    #[error("解码 {archive} 的地图失败: {source}")]
    Layout {
        archive: String,
        #[source]
        source: LayoutError,
    },

    #[error("归档 {archive} 的地图中没有任何屏幕")]
    EmptyWorld { archive: String },

    #[error("写出拼图 {path} 失败: {message}")]
    Save { path: String, message: String },
}

/// 一次渲染任务
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// 世界归档（`.knytt.bin`）
    pub archive: PathBuf,
    /// 输出目录（解包目录与 PNG 都在这里）
    pub output_root: PathBuf,
    /// 共享资源根
    pub asset_root: PathBuf,
    pub config: RenderConfig,
    /// 固定输出文件名中的时间戳，None 时取当前时间
    pub timestamp: Option<String>,
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// 写出的 PNG
    pub output: PathBuf,
    /// 解包目录（未解包时为 None）
    pub world_dir: Option<PathBuf>,
    pub world_name: String,
    pub screens: usize,
    pub bounds: WorldBounds,
    pub mosaic_size: (u32, u32),
    pub cache: CacheStats,
    /// 缺失的资源
    pub missing: Vec<ResourceKind>,
}

impl RenderJob {
    pub fn new(
        archive: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        asset_root: impl Into<PathBuf>,
        config: RenderConfig,
    ) -> Self {
        Self {
            archive: archive.into(),
            output_root: output_root.into(),
            asset_root: asset_root.into(),
            config,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// 执行完整流程
    pub fn run(&self) -> Result<RenderReport, PipelineError> {
        self.config.validate()?;
        let archive_name = self.archive.display().to_string();

        // 1. 打开归档
        let archive = ArchiveReader::open(&self.archive).map_err(|source| PipelineError::Archive {
            archive: archive_name.clone(),
            source,
        })?;
        info!(
            archive = %archive_name,
            root = archive.root_name(),
            files = archive.file_count(),
            "归档已打开"
        );
        if archive.declared_count() as usize != archive.file_count() {
            warn!(
                declared = archive.declared_count(),
                actual = archive.file_count(),
                "归档头部声明的文件数与实际不符"
            );
        }
        let archive = Arc::new(archive);

        // 2. 解包或直接从归档读取世界资源
        let (world_source, world_dir): (Arc<dyn ResourceSource>, Option<PathBuf>) =
            if self.config.extract {
                let dir = archive
                    .save_all(&self.output_root)
                    .map_err(|source| PipelineError::Extract {
                        archive: archive_name.clone(),
                        source,
                    })?;
                info!(dir = %dir.display(), "归档已解包");
                let source: Arc<dyn ResourceSource> = Arc::new(FsSource::new(&dir));
                (source, Some(dir))
            } else {
                let source: Arc<dyn ResourceSource> = Arc::new(ArchiveSource::new(Arc::clone(&archive)));
                (source, None)
            };

        // 3. 地图与配置
        let mut world = load_world(&archive, world_dir.as_deref(), &archive_name)?;
        let ini = archive
            .find_ignore_case(WORLD_INI)
            .and_then(|path| archive.get_file(path).ok())
            .map(WorldIni::from_bytes)
            .unwrap_or_default();
        world.set_metadata(ini.metadata());

        let bounds = world.bounds();
        info!(
            screens = world.len(),
            left = bounds.left,
            top = bounds.top,
            width = bounds.width,
            height = bounds.height,
            name = %world.metadata().name,
            "地图已解码"
        );

        // 4. 预加载资源
        let resolver = ResourceResolver::new(Arc::new(FsSource::new(&self.asset_root)), world_source);
        let compositor = ScreenCompositor::from_ini(&ini, self.config.render_options());
        let mut cache = ImageCache::new();
        let kinds: BTreeSet<_> = world
            .iter()
            .flat_map(|screen| compositor.required_resources(screen))
            .collect();
        debug!(resources = kinds.len(), "预加载资源");
        cache.preload(&resolver, kinds);

        // 5. 合成
        let mosaic = WorldCompositor::new(self.config.mosaic_columns).render_world(
            &world,
            &compositor,
            &cache,
            self.config.parallel,
        );

        // 6. 写出
        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());
        let output = self
            .output_root
            .join(output_file_name(archive.root_name(), &timestamp));
        save_png(&mosaic, &output)?;

        let stats = cache.stats();
        info!(
            path = %output.display(),
            width = mosaic.width(),
            height = mosaic.height(),
            loaded = stats.loaded,
            missing = stats.missing,
            "拼图已写出"
        );

        Ok(RenderReport {
            output,
            world_dir,
            world_name: archive.root_name().to_string(),
            screens: world.len(),
            bounds,
            mosaic_size: mosaic.dimensions(),
            cache: stats,
            missing: cache.missing().cloned().collect(),
        })
    }
}

/// 找到 Map.bin（忽略大小写）并解码
///
/// 已解包时读取磁盘上的地图文件，否则直接解码归档中的内容。
fn load_world(
    archive: &ArchiveReader,
    world_dir: Option<&Path>,
    archive_name: &str,
) -> Result<World, PipelineError> {
    let empty_world = || PipelineError::EmptyWorld {
        archive: archive_name.to_string(),
    };
    let map_path = archive
        .find_ignore_case(MAP_FILE)
        .ok_or_else(|| PipelineError::MapNotFound {
            archive: archive_name.to_string(),
        })?;

    let decoded = match world_dir {
        Some(dir) => {
            let path = dir.join(map_path);
            debug!(path = %path.display(), "读取解包后的地图");
            layout::load(path)
        }
        None => {
            let bytes = archive
                .get_file(map_path)
                .map_err(|source| PipelineError::Archive {
                    archive: archive_name.to_string(),
                    source,
                })?;
            layout::decode(bytes)
        }
    };

    match decoded {
        Ok(world) if world.is_empty() => Err(empty_world()),
        Ok(world) => Ok(world),
        // 解压后一个字节都没有
        Err(LayoutError::NotALayout { first: None }) => Err(empty_world()),
        Err(source) => Err(PipelineError::Layout {
            archive: archive_name.to_string(),
            source,
        }),
    }
}

fn save_png(mosaic: &image::RgbaImage, output: &Path) -> Result<(), PipelineError> {
    let save_error = |message: String| PipelineError::Save {
        path: output.display().to_string(),
        message,
    };
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| save_error(e.to_string()))?;
    }
    mosaic.save(output).map_err(|e| save_error(e.to_string()))
}
