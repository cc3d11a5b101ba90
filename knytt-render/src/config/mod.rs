//! # Config 模块
//!
//! 渲染配置，集中管理所有可调项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件（`--config <file.json>`）
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::compositor::RenderOptions;

/// 渲染配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// 拼图每行的屏幕数
    #[serde(default = "default_mosaic_columns")]
    pub mosaic_columns: u32,

    /// 是否经过规则表过滤调试物件
    ///
    /// 关闭后所有物件按地图中存储的 bank/id 原样绘制。
    #[serde(default = "default_true")]
    pub remove_debug_objects: bool,

    /// 是否隐藏幽灵物件
    #[serde(default)]
    pub remove_ghost_objects: bool,

    /// 是否在每个屏幕左上角绘制坐标
    #[serde(default)]
    pub coordinate_labels: bool,

    /// 是否先把归档解包到输出目录
    ///
    /// 关闭时世界资源直接从内存中的归档读取。
    #[serde(default = "default_true")]
    pub extract: bool,

    /// 是否并行合成屏幕
    #[serde(default = "default_true")]
    pub parallel: bool,
}

// 默认值函数
fn default_mosaic_columns() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mosaic_columns: default_mosaic_columns(),
            remove_debug_objects: true,
            remove_ghost_objects: false,
            coordinate_labels: false,
            extract: true,
            parallel: true,
        }
    }
}

impl RenderConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mosaic_columns == 0 {
            return Err(ConfigError::ValidationFailed(
                "mosaic_columns 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 单屏合成选项
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            remove_debug_objects: self.remove_debug_objects,
            remove_ghost_objects: self.remove_ghost_objects,
            coordinate_label: self.coordinate_labels,
        }
    }
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 序列化失败
    SerializationFailed(String),
    /// IO 错误
    IoError(String),
    /// 验证失败
    ValidationFailed(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::SerializationFailed(e) => write!(f, "配置序列化失败: {}", e),
            ConfigError::IoError(e) => write!(f, "配置 IO 错误: {}", e),
            ConfigError::ValidationFailed(e) => write!(f, "配置验证失败: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
