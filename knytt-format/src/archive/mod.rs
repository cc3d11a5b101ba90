//! # Archive 模块
//!
//! NF 归档容器（`.knytt.bin`）的读取。
//!
//! ## 二进制布局
//!
//! ```text
//! "NF"  root_name\0  count:u32le
//! ( "NF"  path\0  size:u32le  content[size] )*   ← 一直读到流结束
//! ```
//!
//! - `count` 只读不用，条目数以实际扫描结果为准
//! - 路径中的 `\` 在读取时统一替换为 `/`
//! - 末尾条目数据不足时整体视为格式错误

mod writer;

pub use writer::ArchiveWriter;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, FormatError};
use crate::reader::ByteReader;

/// 容器魔数
pub const MAGIC: [u8; 2] = *b"NF";

/// 归档条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// 虚拟路径（`/` 分隔）
    pub path: String,
    /// 文件内容
    pub content: Vec<u8>,
}

/// 归档读取器
///
/// 打开时把整个容器解析成内存中的虚拟文件表。
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    /// 根目录名（通常是世界名称）
    root_name: String,
    /// 头部声明的文件数（不参与解析）
    declared_count: u32,
    /// 按归档顺序保存的条目
    entries: Vec<ArchiveEntry>,
    /// 虚拟路径 -> entries 下标
    index: HashMap<String, usize>,
}

impl ArchiveReader {
    /// 打开归档文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArchiveError::NotFound {
                path: path.display().to_string(),
            });
        }
        let bytes = fs::read(path).map_err(|e| ArchiveError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&bytes)
    }

    /// 从内存解析归档
    pub fn parse(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.take(MAGIC.len()).map_err(|_| FormatError::BadMagic {
            expected: MAGIC.to_vec(),
            actual: bytes.to_vec(),
        })?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic {
                expected: MAGIC.to_vec(),
                actual: magic.to_vec(),
            }
            .into());
        }

        let root_name = reader.read_cstring()?;
        let declared_count = reader.read_u32_le()?;

        let mut archive = Self {
            root_name,
            declared_count,
            entries: Vec::new(),
            index: HashMap::new(),
        };

        while !reader.is_empty() {
            // 每个条目前的 "NF" 标记，不做校验
            reader.skip(2)?;
            let path = reader.read_cstring()?.replace('\\', "/");
            let size = reader.read_u32_le()? as usize;
            let content = reader.take(size)?.to_vec();
            archive.insert(ArchiveEntry { path, content });
        }

        Ok(archive)
    }

    /// 插入条目；同名路径后者覆盖前者，位置保持不变
    fn insert(&mut self, entry: ArchiveEntry) {
        match self.index.get(&entry.path) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.index.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// 根目录名
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// 实际解析出的文件数
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// 头部声明的文件数
    pub fn declared_count(&self) -> u32 {
        self.declared_count
    }

    /// 所有条目（归档顺序）
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// 列出虚拟路径
    ///
    /// `filter` 为子串匹配（区分大小写），`None` 表示全部。
    pub fn list_files(&self, filter: Option<&str>) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.path.as_str())
            .filter(|p| filter.is_none_or(|f| p.contains(f)))
            .collect()
    }

    /// 按虚拟路径查找（忽略 ASCII 大小写）
    pub fn find_ignore_case(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .map(|e| e.path.as_str())
            .find(|p| p.eq_ignore_ascii_case(path))
    }

    /// 是否包含该虚拟路径
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// 读取文件内容
    pub fn get_file(&self, path: &str) -> Result<&[u8], ArchiveError> {
        self.index
            .get(path)
            .map(|&slot| self.entries[slot].content.as_slice())
            .ok_or_else(|| ArchiveError::EntryNotFound {
                path: path.to_string(),
            })
    }

    /// 读取文件大小
    pub fn get_file_size(&self, path: &str) -> Result<usize, ArchiveError> {
        self.get_file(path).map(<[u8]>::len)
    }

    /// 写出单个文件到 `output_root/root_name/path`
    ///
    /// 返回写出的完整路径。
    pub fn save_file(&self, path: &str, output_root: impl AsRef<Path>) -> Result<PathBuf, ArchiveError> {
        let content = self.get_file(path)?;
        let target = self.target_path(path, output_root.as_ref())?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&target, content).map_err(|e| io_error(&target, e))?;

        Ok(target)
    }

    /// 写出所有文件
    ///
    /// 返回 `output_root/root_name` 目录。
    pub fn save_all(&self, output_root: impl AsRef<Path>) -> Result<PathBuf, ArchiveError> {
        let output_root = output_root.as_ref();
        let world_dir = output_root.join(&self.root_name);
        fs::create_dir_all(&world_dir).map_err(|e| io_error(&world_dir, e))?;

        for entry in &self.entries {
            self.save_file(&entry.path, output_root)?;
        }
        Ok(world_dir)
    }

    /// 计算写出目标，拒绝逃逸出输出目录的路径
    fn target_path(&self, path: &str, output_root: &Path) -> Result<PathBuf, ArchiveError> {
        let unsafe_path = || ArchiveError::UnsafePath {
            path: path.to_string(),
        };

        if path.starts_with('/') || self.root_name.contains(['/', '\\']) {
            return Err(unsafe_path());
        }

        let mut target = output_root.join(&self.root_name);
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => return Err(unsafe_path()),
                c if c.contains(':') => return Err(unsafe_path()),
                c => target.push(c),
            }
        }
        Ok(target)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
