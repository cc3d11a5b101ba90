//! # Layout 模块
//!
//! 地图文件（`Map.bin`）的解码与编码。
//!
//! ## 数据流
//!
//! ```text
//! 文件字节 ──(1F 8B ? gunzip : 原样)──► 缓冲区（必须以 'x' 开头）
//!   ( "x<int>y<int>"\0  len:u32le  payload[len] )*   ← 一直读到缓冲区结束
//! ```
//!
//! payload 的切分方式见 [`descriptor`]。

pub mod descriptor;
mod screen;
mod world;

pub use descriptor::{
    CELL_COUNT, GRID_COLUMNS, GRID_ROWS, LAYERS, LayerKind, LayerSpec, OBJECT_LAYERS,
    ScreenSetting, TILE_LAYERS, TILE_SIZE,
};
pub use screen::{ObjectCell, Screen, ScreenKey, coordinate_hash};
pub use world::{World, WorldBounds};

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{FormatError, LayoutError};
use crate::ini::WorldIni;
use crate::reader::{ByteReader, write_cstring};

/// gzip 魔数
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// 世界配置文件名（与地图文件同目录）
pub const WORLD_INI: &str = "World.ini";

/// 地图文件名
pub const MAP_FILE: &str = "Map.bin";

/// 加载地图文件
///
/// 同目录下的 `World.ini` 存在时读取世界元数据，否则元数据为空。
pub fn load(path: impl AsRef<Path>) -> Result<World, LayoutError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LayoutError::NotFound {
            path: path.display().to_string(),
        });
    }

    let bytes = fs::read(path).map_err(|e| LayoutError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut world = decode(&bytes)?;

    let ini_path = path.with_file_name(WORLD_INI);
    if ini_path.exists() {
        let ini = WorldIni::load(&ini_path).map_err(|e| LayoutError::Io {
            path: ini_path.display().to_string(),
            message: e.to_string(),
        })?;
        world.set_metadata(ini.metadata());
    }

    Ok(world)
}

/// 解码地图字节（gzip 或原始）
pub fn decode(bytes: &[u8]) -> Result<World, LayoutError> {
    let buffer = decompress(bytes)?;
    decode_raw(&buffer)
}

/// gzip 数据则解压，否则原样返回
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, LayoutError> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }
    let mut buffer = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut buffer)
        .map_err(|e| LayoutError::Decompress {
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// 解码已解压的地图缓冲区
pub fn decode_raw(buffer: &[u8]) -> Result<World, LayoutError> {
    if buffer.first() != Some(&b'x') {
        return Err(LayoutError::NotALayout {
            first: buffer.first().copied(),
        });
    }

    let mut reader = ByteReader::new(buffer);
    let mut world = World::new();

    while !reader.is_empty() {
        let name = reader.read_cstring()?;
        let (x, y) = parse_screen_name(&name)?;
        let len = reader.read_u32_le()? as usize;
        let payload = reader.take(len)?;
        world.insert(Screen::from_payload(x, y, payload)?);
    }

    Ok(world)
}

/// 解析 `x<int>y<int>`
fn parse_screen_name(name: &str) -> Result<(i32, i32), FormatError> {
    let invalid = || FormatError::InvalidScreenName {
        name: name.to_string(),
    };

    let (x, y) = name
        .strip_prefix('x')
        .and_then(|rest| rest.split_once('y'))
        .ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok((x, y))
}

/// 编码为未压缩的地图缓冲区
pub fn encode<'a>(screens: impl IntoIterator<Item = &'a Screen>) -> Vec<u8> {
    let mut out = Vec::new();
    for screen in screens {
        write_cstring(&mut out, &format!("x{}y{}", screen.x(), screen.y()));
        let payload = screen.to_payload();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&payload);
    }
    out
}

/// 编码为 gzip 压缩的地图文件内容
pub fn encode_gzip<'a>(screens: impl IntoIterator<Item = &'a Screen>) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&encode(screens))?;
    encoder.finish()
}
