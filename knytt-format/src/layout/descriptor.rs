//! # 屏幕数据布局描述
//!
//! 每个屏幕的原始数据都是定长结构，所有固定偏移集中在这里，
//! 解码器、编码器和渲染器都查这张表，不在别处写字面量偏移。
//!
//! ```text
//! 0     250   500   750   1000  1500  2000  2500  3000   3006
//! │tile0│tile1│tile2│tile3│ obj4 │ obj5 │ obj6 │ obj7 │settings│
//! ```
//!
//! 物件层前 250 字节为物件 id，后 250 字节为 bank，按格子下标对齐。

use serde::Serialize;

/// 网格列数
pub const GRID_COLUMNS: usize = 25;
/// 网格行数
pub const GRID_ROWS: usize = 10;
/// 每层格子数
pub const CELL_COUNT: usize = GRID_COLUMNS * GRID_ROWS;

/// 单个图块的像素边长
pub const TILE_SIZE: u32 = 24;

/// 全部图层字节数
pub const LAYER_BYTES: usize = 3000;
/// 设置字节偏移
pub const SETTINGS_OFFSET: usize = 3000;
/// 屏幕数据最小长度
pub const MIN_SCREEN_LEN: usize = SETTINGS_OFFSET + ScreenSetting::ALL.len();

/// 图层类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerKind {
    /// 地形图块，每格 1 字节
    Tile,
    /// 物件，每格 id + bank 两字节
    Object,
}

/// 单个图层的位置描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub offset: usize,
    pub len: usize,
    pub kind: LayerKind,
}

impl LayerSpec {
    const fn tile(offset: usize) -> Self {
        Self {
            offset,
            len: CELL_COUNT,
            kind: LayerKind::Tile,
        }
    }

    const fn object(offset: usize) -> Self {
        Self {
            offset,
            len: CELL_COUNT * 2,
            kind: LayerKind::Object,
        }
    }

    /// 对应的字节范围
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// 8 个图层：4 个图块层在前，4 个物件层在后
pub const LAYERS: [LayerSpec; 8] = [
    LayerSpec::tile(0),
    LayerSpec::tile(250),
    LayerSpec::tile(500),
    LayerSpec::tile(750),
    LayerSpec::object(1000),
    LayerSpec::object(1500),
    LayerSpec::object(2000),
    LayerSpec::object(2500),
];

/// 图块层数
pub const TILE_LAYERS: usize = 4;
/// 物件层数
pub const OBJECT_LAYERS: usize = 4;

/// 屏幕设置项
///
/// 枚举顺序即字节顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScreenSetting {
    TileSetA,
    TileSetB,
    AmbianceA,
    AmbianceB,
    Music,
    Gradient,
}

impl ScreenSetting {
    pub const ALL: [ScreenSetting; 6] = [
        ScreenSetting::TileSetA,
        ScreenSetting::TileSetB,
        ScreenSetting::AmbianceA,
        ScreenSetting::AmbianceB,
        ScreenSetting::Music,
        ScreenSetting::Gradient,
    ];

    /// 在设置块内的下标
    pub fn index(self) -> usize {
        self as usize
    }

    /// 在屏幕数据中的绝对偏移
    pub fn offset(self) -> usize {
        SETTINGS_OFFSET + self.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_are_contiguous() {
        let mut expected = 0;
        for layer in LAYERS {
            assert_eq!(layer.offset, expected);
            expected += layer.len;
        }
        assert_eq!(expected, LAYER_BYTES);
        assert_eq!(LAYER_BYTES, SETTINGS_OFFSET);
    }

    #[test]
    fn test_layer_kinds() {
        assert!(LAYERS[..TILE_LAYERS].iter().all(|l| l.kind == LayerKind::Tile && l.len == 250));
        assert!(LAYERS[TILE_LAYERS..].iter().all(|l| l.kind == LayerKind::Object && l.len == 500));
    }

    #[test]
    fn test_setting_offsets() {
        assert_eq!(ScreenSetting::TileSetA.offset(), 3000);
        assert_eq!(ScreenSetting::Gradient.offset(), 3005);
        assert_eq!(MIN_SCREEN_LEN, 3006);
    }
}
