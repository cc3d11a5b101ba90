//! # Error 模块
//!
//! 定义 knytt-format 中使用的错误类型。

use thiserror::Error;

/// 二进制格式错误
///
/// 出现即表示本次解码失败，但不会导致进程崩溃。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// 魔数不匹配
    #[error("魔数不匹配：期望 {expected:?}，实际 {actual:?}")]
    BadMagic { expected: Vec<u8>, actual: Vec<u8> },

    /// 数据被截断
    #[error("偏移 {offset} 处数据截断：需要 {needed} 字节，剩余 {remaining} 字节")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// 字符串缺少结尾的 0 字节
    #[error("偏移 {offset} 处的字符串没有以 0 结尾")]
    UnterminatedString { offset: usize },

    /// 屏幕名称不是 `x<int>y<int>` 形式
    #[error("无效的屏幕坐标名称 '{name}'")]
    InvalidScreenName { name: String },

    /// 屏幕数据长度不足以切出固定偏移处的字段
    #[error("屏幕 ({x}, {y}) 数据长度 {len} 不足 {required} 字节")]
    ShortScreen {
        x: i32,
        y: i32,
        len: usize,
        required: usize,
    },
}

/// 归档读取错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchiveError {
    /// 归档文件不存在
    #[error("归档文件不存在: {path}")]
    NotFound { path: String },

    /// 归档内没有该虚拟文件
    #[error("归档内不存在文件: {path}")]
    EntryNotFound { path: String },

    /// 虚拟路径试图写出到输出目录之外
    #[error("不安全的虚拟路径: {path}")]
    UnsafePath { path: String },

    /// 格式错误
    #[error("归档格式错误: {0}")]
    Format(#[from] FormatError),

    /// IO 错误
    #[error("归档 IO 错误: {path} - {message}")]
    Io { path: String, message: String },
}

/// 地图解码错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// 地图文件不存在
    #[error("地图文件不存在: {path}")]
    NotFound { path: String },

    /// 内容不是以 'x' 开头，不是可识别的地图
    #[error("不是可识别的地图数据（首字节 {first:?}）")]
    NotALayout { first: Option<u8> },

    /// gzip 解压失败
    #[error("地图解压失败: {message}")]
    Decompress { message: String },

    /// 格式错误
    #[error("地图格式错误: {0}")]
    Format(#[from] FormatError),

    /// IO 错误
    #[error("地图 IO 错误: {path} - {message}")]
    Io { path: String, message: String },
}

/// Result 类型别名
pub type FormatResult<T> = Result<T, FormatError>;
