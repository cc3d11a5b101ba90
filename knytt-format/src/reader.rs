//! # Reader 模块
//!
//! 归档与地图共用的字节游标。
//!
//! 两种格式都只有三种原语：0 结尾的单字节字符串、4 字节小端整数、定长字节块。

use crate::error::{FormatError, FormatResult};

/// 字节游标
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 当前偏移
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余字节数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// 是否已读到末尾
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// 读取 `len` 字节
    pub fn take(&mut self, len: usize) -> FormatResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// 跳过 `len` 字节
    pub fn skip(&mut self, len: usize) -> FormatResult<()> {
        self.take(len).map(|_| ())
    }

    /// 读取 4 字节小端无符号整数
    ///
    /// 按字节显式重组：`b0 + b1*256 + b2*65536 + b3*16777216`。
    pub fn read_u32_le(&mut self) -> FormatResult<u32> {
        let b = self.take(4)?;
        Ok(b[0] as u32 + (b[1] as u32) * 256 + (b[2] as u32) * 65536 + (b[3] as u32) * 16777216)
    }

    /// 读取 0 结尾的字符串（不含结尾的 0）
    ///
    /// 字节按 Latin-1 逐个映射为字符，保证与 [`write_cstring`] 互逆。
    pub fn read_cstring(&mut self) -> FormatResult<String> {
        let start = self.pos;
        let rest = &self.data[start..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(FormatError::UnterminatedString { offset: start })?;
        self.pos += len + 1;
        Ok(rest[..len].iter().map(|&b| b as char).collect())
    }
}

/// 写出 0 结尾的 Latin-1 字符串
///
/// 超出单字节范围的字符写为 `?`。
pub fn write_cstring(out: &mut Vec<u8>, s: &str) {
    out.extend(s.chars().map(|c| u8::try_from(c as u32).unwrap_or(b'?')));
    out.push(0);
}
