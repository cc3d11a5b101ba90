//! # Knytt Format
//!
//! Knytt 世界数据格式的纯解析库。
//!
//! ## 架构概述
//!
//! `knytt-format` 不依赖任何渲染或日志框架，只负责把字节变成类型化的数据：
//!
//! ```text
//! .knytt.bin ──► ArchiveReader ──► 虚拟文件表
//!                                     │
//!                         Map.bin ────┤──► layout::decode ──► World (Screen 集合)
//!                       World.ini ────┘──► WorldIni ──► WorldMetadata / CustomObject
//! ```
//!
//! 渲染时每个物件格子都先经过 [`rules::can_draw`] 决定是否绘制、是否重定向。
//!
//! ## 模块结构
//!
//! - [`reader`]：小端字节游标
//! - [`archive`]：NF 归档容器的读取与写出
//! - [`layout`]：地图解码/编码、Screen 与 World
//! - [`rules`]：物件可见性与重定向规则表
//! - [`ini`]：World.ini 键值配置读取
//! - [`error`]：错误类型定义

pub mod archive;
pub mod error;
pub mod ini;
pub mod layout;
pub mod reader;
pub mod rules;

// 重导出核心类型
pub use archive::{ArchiveEntry, ArchiveReader, ArchiveWriter};
pub use error::{ArchiveError, FormatError, FormatResult, LayoutError};
pub use ini::{CustomObject, WorldIni, WorldMetadata};
pub use layout::{
    CELL_COUNT, GRID_COLUMNS, GRID_ROWS, LayerKind, ObjectCell, OBJECT_LAYERS, Screen, ScreenKey,
    ScreenSetting, TILE_LAYERS, TILE_SIZE, World, WorldBounds,
};
pub use rules::{CUSTOM_OBJECT_BANK, RuleOutcome, can_draw};
