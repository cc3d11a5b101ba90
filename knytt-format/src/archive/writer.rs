//! NF 归档写出，与 [`ArchiveReader`](super::ArchiveReader) 互逆。

use super::{ArchiveEntry, MAGIC};
use crate::reader::write_cstring;

/// 归档写出器
#[derive(Debug, Clone, Default)]
pub struct ArchiveWriter {
    root_name: String,
    entries: Vec<ArchiveEntry>,
}

impl ArchiveWriter {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            entries: Vec::new(),
        }
    }

    /// 添加文件
    ///
    /// 路径中的 `\` 会被替换为 `/`。
    pub fn add(&mut self, path: impl AsRef<str>, content: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(ArchiveEntry {
            path: path.as_ref().replace('\\', "/"),
            content: content.into(),
        });
        self
    }

    /// 已添加的文件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 编码为字节
    ///
    /// 路径写成 Windows 风格的 `\` 分隔。
    pub fn finish(&self) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        write_cstring(&mut out, &self.root_name);
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        for entry in &self.entries {
            out.extend_from_slice(&MAGIC);
            write_cstring(&mut out, &entry.path.replace('/', "\\"));
            out.extend_from_slice(&(entry.content.len() as u32).to_le_bytes());
            out.extend_from_slice(&entry.content);
        }
        out
    }
}
