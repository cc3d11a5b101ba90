//! # Screen 模块
//!
//! 单个屏幕（25×10 网格）的数据模型。

use serde::Serialize;

use super::descriptor::{
    CELL_COUNT, LAYER_BYTES, LAYERS, MIN_SCREEN_LEN, OBJECT_LAYERS, ScreenSetting, TILE_LAYERS,
};
use crate::error::{FormatError, FormatResult};

/// 旧版坐标哈希
///
/// `hash = (23 * 37 + x) * 37 + y`，按 i32 环绕运算。
/// 同一坐标永远得到同一值，但不同坐标可能碰撞（例如 `(0, 37)` 与 `(1, 0)`），
/// 因此 [`World`](super::World) 以 [`ScreenKey`] 结构化键索引，哈希仅作兼容输出。
pub fn coordinate_hash(x: i32, y: i32) -> i32 {
    let mut hash: i32 = 23;
    hash = hash.wrapping_mul(37).wrapping_add(x);
    hash = hash.wrapping_mul(37).wrapping_add(y);
    hash
}

/// 屏幕坐标键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScreenKey {
    pub x: i32,
    pub y: i32,
}

impl ScreenKey {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 旧版哈希值
    pub fn legacy_hash(&self) -> i32 {
        coordinate_hash(self.x, self.y)
    }
}

/// 物件格子内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectCell {
    pub bank: u8,
    pub id: u8,
}

impl ObjectCell {
    /// id 为 0 的格子为空
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }
}

/// 屏幕
///
/// 创建后不可变（构造辅助方法除外），图层大小由格式固定。
#[derive(Clone, PartialEq, Eq)]
pub struct Screen {
    key: ScreenKey,
    settings: [u8; ScreenSetting::ALL.len()],
    /// 8 个图层的原始字节，按 [`LAYERS`] 切分
    layers: Box<[u8; LAYER_BYTES]>,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("x", &self.key.x)
            .field("y", &self.key.y)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Screen {
    /// 创建空屏幕
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            key: ScreenKey::new(x, y),
            settings: [0; ScreenSetting::ALL.len()],
            layers: Box::new([0; LAYER_BYTES]),
        }
    }

    /// 从屏幕原始数据构造
    pub fn from_payload(x: i32, y: i32, payload: &[u8]) -> FormatResult<Self> {
        if payload.len() < MIN_SCREEN_LEN {
            return Err(FormatError::ShortScreen {
                x,
                y,
                len: payload.len(),
                required: MIN_SCREEN_LEN,
            });
        }

        let mut screen = Self::new(x, y);
        screen.layers.copy_from_slice(&payload[..LAYER_BYTES]);
        for setting in ScreenSetting::ALL {
            screen.settings[setting.index()] = payload[setting.offset()];
        }
        Ok(screen)
    }

    /// 编码为屏幕原始数据（3006 字节）
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_SCREEN_LEN);
        out.extend_from_slice(self.layers.as_slice());
        out.extend_from_slice(&self.settings);
        out
    }

    pub fn x(&self) -> i32 {
        self.key.x
    }

    pub fn y(&self) -> i32 {
        self.key.y
    }

    pub fn key(&self) -> ScreenKey {
        self.key
    }

    /// 旧版坐标哈希
    pub fn legacy_hash(&self) -> i32 {
        self.key.legacy_hash()
    }

    pub fn setting(&self, setting: ScreenSetting) -> u8 {
        self.settings[setting.index()]
    }

    pub fn set_setting(&mut self, setting: ScreenSetting, value: u8) -> &mut Self {
        self.settings[setting.index()] = value;
        self
    }

    /// 第 `index` 个图层（0..8）的原始字节
    pub fn layer(&self, index: usize) -> &[u8] {
        &self.layers[LAYERS[index].range()]
    }

    /// 图块层 `layer`（0..4）第 `cell` 格的值
    pub fn tile(&self, layer: usize, cell: usize) -> u8 {
        assert!(layer < TILE_LAYERS, "图块层下标越界: {layer}");
        self.layer(layer)[cell]
    }

    pub fn set_tile(&mut self, layer: usize, cell: usize, value: u8) -> &mut Self {
        assert!(layer < TILE_LAYERS, "图块层下标越界: {layer}");
        assert!(cell < CELL_COUNT, "格子下标越界: {cell}");
        self.layers[LAYERS[layer].offset + cell] = value;
        self
    }

    /// 物件层 `layer`（0..4，对应图层 4..8）第 `cell` 格的内容
    pub fn object(&self, layer: usize, cell: usize) -> ObjectCell {
        assert!(layer < OBJECT_LAYERS, "物件层下标越界: {layer}");
        assert!(cell < CELL_COUNT, "格子下标越界: {cell}");
        let bytes = self.layer(TILE_LAYERS + layer);
        ObjectCell {
            id: bytes[cell],
            bank: bytes[CELL_COUNT + cell],
        }
    }

    pub fn set_object(&mut self, layer: usize, cell: usize, bank: u8, id: u8) -> &mut Self {
        assert!(layer < OBJECT_LAYERS, "物件层下标越界: {layer}");
        assert!(cell < CELL_COUNT, "格子下标越界: {cell}");
        let offset = LAYERS[TILE_LAYERS + layer].offset;
        self.layers[offset + cell] = id;
        self.layers[offset + CELL_COUNT + cell] = bank;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::descriptor::GRID_COLUMNS;
    use std::collections::HashSet;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(coordinate_hash(1000, 1000), coordinate_hash(1000, 1000));
        assert_eq!(coordinate_hash(0, 0), 23 * 37 * 37);
        assert_eq!(coordinate_hash(-3, 7), (23 * 37 - 3) * 37 + 7);
    }

    #[test]
    fn test_hash_wraps_instead_of_overflowing() {
        let _ = coordinate_hash(i32::MAX, i32::MAX);
        let _ = coordinate_hash(i32::MIN, i32::MIN);
    }

    #[test]
    fn test_hash_unique_on_narrow_band() {
        // y 的跨度小于 37 时哈希无碰撞
        let mut seen = HashSet::new();
        for x in -50..=50 {
            for y in -18..=18 {
                assert!(seen.insert(coordinate_hash(x, y)), "碰撞: ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_legacy_hash_known_collision() {
        assert_eq!(coordinate_hash(0, 37), coordinate_hash(1, 0));
        assert_ne!(ScreenKey::new(0, 37), ScreenKey::new(1, 0));
    }

    #[test]
    fn test_payload_slicing() {
        let mut payload = vec![0u8; 3506];
        payload[0] = 1; // tile0 第 0 格
        payload[250 + 26] = 2; // tile1 第 26 格
        payload[1000 + 3] = 9; // obj4 第 3 格 id
        payload[1250 + 3] = 15; // obj4 第 3 格 bank
        payload[2999] = 7; // obj7 最后一格 bank
        payload[3005] = 4; // Gradient

        let screen = Screen::from_payload(2, -1, &payload).unwrap();
        assert_eq!(screen.tile(0, 0), 1);
        assert_eq!(screen.tile(1, GRID_COLUMNS + 1), 2);
        assert_eq!(screen.object(0, 3), ObjectCell { bank: 15, id: 9 });
        assert_eq!(screen.object(3, CELL_COUNT - 1).bank, 7);
        assert_eq!(screen.setting(ScreenSetting::Gradient), 4);
        assert_eq!(screen.setting(ScreenSetting::TileSetA), 0);
    }

    #[test]
    fn test_short_payload() {
        let err = Screen::from_payload(0, 0, &[0u8; 3005]).unwrap_err();
        assert_eq!(
            err,
            FormatError::ShortScreen {
                x: 0,
                y: 0,
                len: 3005,
                required: 3006
            }
        );
    }

    #[test]
    fn test_setters_match_payload() {
        let mut screen = Screen::new(0, 0);
        screen
            .set_tile(2, 10, 130)
            .set_object(1, 5, 13, 8)
            .set_setting(ScreenSetting::Music, 3);

        let reparsed = Screen::from_payload(0, 0, &screen.to_payload()).unwrap();
        assert_eq!(reparsed, screen);
        assert_eq!(reparsed.layer(2)[10], 130);
        assert_eq!(reparsed.layer(5)[5], 8);
        assert_eq!(reparsed.layer(5)[CELL_COUNT + 5], 13);
    }

    #[test]
    #[should_panic]
    fn test_cell_out_of_range_panics() {
        Screen::new(0, 0).tile(0, CELL_COUNT);
    }
}
