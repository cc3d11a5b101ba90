//! # Ini 模块
//!
//! `World.ini` 键值配置读取。
//!
//! ```text
//! [World]
//! Name=The Machine
//! Author=Nifflas
//!
//! [Custom Object 1]
//! Image=Eye.png
//! Tile Width=48
//! ```
//!
//! 节名与键名均忽略 ASCII 大小写；`;` 或 `#` 开头的行为注释。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::layout::TILE_SIZE;

const WORLD_SECTION: &str = "World";
const CUSTOM_OBJECT_PREFIX: &str = "custom object ";

/// 世界元数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub size: String,
}

/// 自定义物件（bank 255）的绘制参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomObject {
    /// 物件 id（对应 `[Custom Object N]` 的 N）
    pub id: u8,
    /// 图片文件名（相对于世界的 `Custom Objects/` 目录）
    pub image: String,
    /// 单帧宽度，默认图块大小
    pub tile_width: u32,
    /// 单帧高度，默认图块大小
    pub tile_height: u32,
    /// 绘制偏移
    pub offset_x: i32,
    pub offset_y: i32,
    /// 初始动画帧
    pub init_frame: u32,
}

/// World.ini 内容
#[derive(Debug, Clone, Default)]
pub struct WorldIni {
    /// 小写节名 -> (小写键名 -> 值)
    sections: HashMap<String, HashMap<String, String>>,
}

impl WorldIni {
    /// 读取文件
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::from_bytes(&fs::read(path)?))
    }

    /// 从字节解析
    ///
    /// 合法 UTF-8 按 UTF-8 处理（去掉 BOM），否则按 Latin-1 逐字节映射。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text.trim_start_matches('\u{feff}')),
            Err(_) => Self::parse(&bytes.iter().map(|&b| b as char).collect::<String>()),
        }
    }

    /// 从文本解析
    pub fn parse(text: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = name.trim().to_ascii_lowercase();
                sections.entry(current.clone()).or_default();
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                sections
                    .entry(current.clone())
                    .or_default()
                    .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        Self { sections }
    }

    /// 读取字符串值
    pub fn read_string(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_ascii_lowercase())?
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 读取整数值，不存在或无法解析时返回 None
    pub fn read_int(&self, section: &str, key: &str) -> Option<i32> {
        self.read_string(section, key)?.parse().ok()
    }

    /// `[World]` 节的元数据
    pub fn metadata(&self) -> WorldMetadata {
        let read = |key| self.read_string(WORLD_SECTION, key).unwrap_or_default().to_string();
        WorldMetadata {
            name: read("Name"),
            author: read("Author"),
            description: read("Description"),
            size: read("Size"),
        }
    }

    /// `[Custom Object N]` 的绘制参数
    ///
    /// 节不存在或没有配置 `Image` 时返回 None。
    pub fn custom_object(&self, id: u8) -> Option<CustomObject> {
        let section = format!("Custom Object {id}");
        let image = self.read_string(&section, "Image").filter(|s| !s.is_empty())?;

        let size = |key| {
            self.read_int(&section, key)
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&v| v > 0)
                .unwrap_or(TILE_SIZE)
        };

        Some(CustomObject {
            id,
            image: image.to_string(),
            tile_width: size("Tile Width"),
            tile_height: size("Tile Height"),
            offset_x: self.read_int(&section, "Offset X").unwrap_or(0),
            offset_y: self.read_int(&section, "Offset Y").unwrap_or(0),
            init_frame: self
                .read_int(&section, "Init AnimFrom")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0),
        })
    }

    /// 所有自定义物件，按 id 排序
    pub fn custom_objects(&self) -> Vec<CustomObject> {
        let mut ids: Vec<u8> = self
            .sections
            .keys()
            .filter_map(|name| name.strip_prefix(CUSTOM_OBJECT_PREFIX)?.trim().parse().ok())
            .collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.custom_object(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; comment
[World]
Name = The Machine
Author=Nifflas
Description=A world with machines
Size=Medium

[Custom Object 3]
Image=Eye.png
Tile Width=48
Tile Height=32
Offset X=-12
Offset Y=4
Init AnimFrom=2

[custom object 1]
image=Lamp.png

[Custom Object 7]
Tile Width=12
";

    #[test]
    fn test_metadata() {
        let ini = WorldIni::parse(SAMPLE);
        assert_eq!(
            ini.metadata(),
            WorldMetadata {
                name: "The Machine".to_string(),
                author: "Nifflas".to_string(),
                description: "A world with machines".to_string(),
                size: "Medium".to_string(),
            }
        );
    }

    #[test]
    fn test_lookup_ignores_case() {
        let ini = WorldIni::parse(SAMPLE);
        assert_eq!(ini.read_string("world", "NAME"), Some("The Machine"));
        assert_eq!(ini.read_int("Custom Object 3", "offset x"), Some(-12));
        assert_eq!(ini.read_int("World", "Name"), None);
        assert_eq!(ini.read_string("Missing", "Name"), None);
    }

    #[test]
    fn test_custom_object_attributes() {
        let ini = WorldIni::parse(SAMPLE);
        assert_eq!(
            ini.custom_object(3),
            Some(CustomObject {
                id: 3,
                image: "Eye.png".to_string(),
                tile_width: 48,
                tile_height: 32,
                offset_x: -12,
                offset_y: 4,
                init_frame: 2,
            })
        );
    }

    #[test]
    fn test_custom_object_defaults() {
        let ini = WorldIni::parse(SAMPLE);
        let lamp = ini.custom_object(1).unwrap();
        assert_eq!(lamp.tile_width, TILE_SIZE);
        assert_eq!(lamp.tile_height, TILE_SIZE);
        assert_eq!((lamp.offset_x, lamp.offset_y, lamp.init_frame), (0, 0, 0));

        // 没有 Image 的节不算自定义物件
        assert_eq!(ini.custom_object(7), None);
        assert_eq!(ini.custom_object(200), None);
    }

    #[test]
    fn test_custom_objects_sorted() {
        let ini = WorldIni::parse(SAMPLE);
        let ids: Vec<u8> = ini.custom_objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_latin1_and_bom() {
        let ini = WorldIni::from_bytes(b"[World]\nName=Caf\xe9\n");
        assert_eq!(ini.metadata().name, "Café");

        let ini = WorldIni::from_bytes("\u{feff}[World]\nName=Bom".as_bytes());
        assert_eq!(ini.metadata().name, "Bom");
    }
}
