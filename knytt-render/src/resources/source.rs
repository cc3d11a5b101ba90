//! # Resource Source 模块
//!
//! 资源来源抽象层，支持从不同来源（文件系统、内存中的归档）读取资源。
//!
//! 所有路径参数都是**逻辑路径**：相对于来源根目录、使用 `/` 分隔。
//! 世界资源来自 Windows 环境，文件名大小写并不可靠，两种来源都在精确匹配失败后
//! 再按忽略 ASCII 大小写查找一次。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use knytt_format::ArchiveReader;

use super::ResourceError;
use super::path::normalize_logical_path;

/// 资源来源 trait
pub trait ResourceSource: Send + Sync {
    /// 读取资源字节
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;

    /// 获取资源的完整路径（用于日志）
    fn full_path(&self, path: &str) -> String;
}

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsSource {
    /// 资源根目录
    base_path: PathBuf,
}

impl FsSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 解析逻辑路径到实际文件路径
    ///
    /// 精确路径不存在时逐级按忽略大小写匹配；都找不到时返回精确路径。
    fn resolve(&self, logical_path: &str) -> PathBuf {
        let normalized = normalize_logical_path(logical_path);
        let exact = self.base_path.join(&normalized);
        if exact.exists() {
            return exact;
        }

        let mut current = self.base_path.clone();
        for component in normalized.split('/') {
            match find_ignore_case(&current, component) {
                Some(found) => current = found,
                None => return exact,
            }
        }
        current
    }
}

/// 在目录中按忽略 ASCII 大小写查找一项
fn find_ignore_case(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.exists() {
        return Some(direct);
    }
    fs::read_dir(dir)
        .ok()?
        .flatten()
        .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| entry.path())
}

impl ResourceSource for FsSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full_path = self.resolve(path);

        fs::read(&full_path).map_err(|e| ResourceError::LoadFailed {
            path: full_path.to_string_lossy().to_string(),
            kind: "file".to_string(),
            message: e.to_string(),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn full_path(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().to_string()
    }
}

/// 归档资源来源
///
/// 直接从内存中的归档文件表读取，不需要先解包。
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    archive: Arc<ArchiveReader>,
}

impl ArchiveSource {
    pub fn new(archive: Arc<ArchiveReader>) -> Self {
        Self { archive }
    }

    /// 找到归档内实际的虚拟路径
    fn lookup(&self, path: &str) -> Option<String> {
        let normalized = normalize_logical_path(path);
        if self.archive.contains(&normalized) {
            return Some(normalized);
        }
        self.archive.find_ignore_case(&normalized).map(str::to_string)
    }
}

impl ResourceSource for ArchiveSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let virtual_path = self.lookup(path).ok_or_else(|| ResourceError::NotFound {
            path: self.full_path(path),
        })?;

        self.archive
            .get_file(&virtual_path)
            .map(<[u8]>::to_vec)
            .map_err(|e| ResourceError::LoadFailed {
                path: self.full_path(path),
                kind: "archive".to_string(),
                message: e.to_string(),
            })
    }

    fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn full_path(&self, path: &str) -> String {
        format!(
            "archive://{}#{}",
            self.archive.root_name(),
            normalize_logical_path(path)
        )
    }
}
