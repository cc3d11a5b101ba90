//! # Knytt Render
//!
//! 把 Knytt 世界归档渲染为一整张地图 PNG。
//!
//! ## 架构说明
//!
//! 渲染层负责：
//! - 归档解包与世界资源定位
//! - 图片预加载与缓存
//! - 单屏合成与整图拼接
//! - 输出文件命名与写出
//!
//! 二进制格式的解析全部在 `knytt-format` 中完成，这里只消费解码后的数据。
//!
//! ## 模块结构
//!
//! - [`config`]：渲染配置
//! - [`resources`]：资源来源、定位与缓存
//! - [`compositor`]：屏幕合成与拼图
//! - [`pipeline`]：完整流程

pub mod compositor;
pub mod config;
pub mod pipeline;
pub mod resources;

pub use compositor::{RenderOptions, ScreenCompositor, WorldCompositor};
pub use config::{ConfigError, RenderConfig};
pub use pipeline::{PipelineError, RenderJob, RenderReport};
pub use resources::{
    ArchiveSource, CacheStats, FsSource, ImageCache, ResourceError, ResourceKind, ResourceResolver,
    ResourceSource,
};
