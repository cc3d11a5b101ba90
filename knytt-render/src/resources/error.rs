//! # Resource Error 模块
//!
//! 定义资源读取相关的错误类型。

use thiserror::Error;

/// 资源错误
///
/// 渲染阶段遇到此类错误只跳过对应元素，不中断整张地图。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// 资源读取失败
    #[error("读取 {kind} 资源失败: {path} - {message}")]
    LoadFailed {
        /// 资源路径
        path: String,
        /// 资源类型（file, archive 等）
        kind: String,
        /// 错误消息
        message: String,
    },

    /// 资源未找到
    #[error("资源未找到: {path}")]
    NotFound {
        /// 资源路径
        path: String,
    },

    /// 图片无法解码
    #[error("无效的图片: {path} - {message}")]
    InvalidImage {
        /// 资源路径
        path: String,
        /// 错误消息
        message: String,
    },
}
