//! 单个屏幕的合成

use std::collections::{BTreeSet, HashMap};

use image::{Rgba, RgbaImage};
use knytt_format::{
    CELL_COUNT, CUSTOM_OBJECT_BANK, CustomObject, GRID_COLUMNS, OBJECT_LAYERS, ObjectCell, Screen,
    ScreenSetting, TILE_LAYERS, TILE_SIZE, WorldIni, can_draw,
};
use serde::{Deserialize, Serialize};

use super::{ATLAS_COLUMNS, Rect, SCREEN_HEIGHT, SCREEN_WIDTH, blit, draw_label};
use crate::resources::{ImageCache, ResourceKind};

/// 图块值中选择图块集 B 的位
const TILESET_B_FLAG: u8 = 128;

/// 标签距左上角的边距
const LABEL_MARGIN: u32 = 4;

/// 合成选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// 经过规则表过滤调试物件
    pub remove_debug_objects: bool,
    /// 同时隐藏幽灵物件（bank 12）
    pub remove_ghost_objects: bool,
    /// 左上角绘制坐标标签
    pub coordinate_label: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            remove_debug_objects: true,
            remove_ghost_objects: false,
            coordinate_label: false,
        }
    }
}

/// 一个格子最终要绘制的内容
#[derive(Debug, Clone, PartialEq, Eq)]
enum ObjectDraw<'a> {
    Standard { bank: u8, id: u8 },
    Custom(&'a CustomObject),
}

/// 屏幕合成器
///
/// 只读取预加载好的 [`ImageCache`]，可以在多个线程间共享。
#[derive(Debug, Clone, Default)]
pub struct ScreenCompositor {
    custom_objects: HashMap<u8, CustomObject>,
    options: RenderOptions,
}

impl ScreenCompositor {
    pub fn new(custom_objects: impl IntoIterator<Item = CustomObject>, options: RenderOptions) -> Self {
        Self {
            custom_objects: custom_objects.into_iter().map(|o| (o.id, o)).collect(),
            options,
        }
    }

    /// 从 World.ini 读取自定义物件
    pub fn from_ini(ini: &WorldIni, options: RenderOptions) -> Self {
        Self::new(ini.custom_objects(), options)
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// 屏幕绘制需要的全部资源（去重，有序）
    pub fn required_resources(&self, screen: &Screen) -> BTreeSet<ResourceKind> {
        let mut kinds = BTreeSet::new();
        kinds.insert(ResourceKind::Gradient(screen.setting(ScreenSetting::Gradient)));

        for layer in 0..TILE_LAYERS {
            for cell in 0..CELL_COUNT {
                if let Some(kind) = tileset_for(screen, screen.tile(layer, cell)) {
                    kinds.insert(kind);
                }
            }
        }

        for layer in 0..OBJECT_LAYERS {
            for cell in 0..CELL_COUNT {
                match self.object_draw(screen.object(layer, cell)) {
                    Some(ObjectDraw::Standard { bank, id }) => {
                        kinds.insert(ResourceKind::Object { bank, id });
                    }
                    Some(ObjectDraw::Custom(custom)) => {
                        kinds.insert(ResourceKind::Custom(custom.image.clone()));
                    }
                    None => {}
                }
            }
        }
        kinds
    }

    /// 合成一个 600×240 的屏幕图片
    ///
    /// 缓存中缺失的资源只跳过对应的元素。
    pub fn render(&self, screen: &Screen, cache: &ImageCache) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Rgba([0, 0, 0, 255]));

        // 1. 背景渐变，水平平铺
        let gradient = ResourceKind::Gradient(screen.setting(ScreenSetting::Gradient));
        if let Some(src) = cache.get(&gradient).filter(|src| src.width() > 0) {
            for x in (0..SCREEN_WIDTH).step_by(src.width() as usize) {
                blit(&mut img, src, Rect::of(src), x as i32, 0);
            }
        }

        // 2. 图块层
        for layer in 0..TILE_LAYERS {
            for cell in 0..CELL_COUNT {
                let value = screen.tile(layer, cell);
                let Some(kind) = tileset_for(screen, value) else {
                    continue;
                };
                let Some(atlas) = cache.get(&kind) else {
                    continue;
                };
                let index = (value % TILESET_B_FLAG) as u32;
                let rect = Rect::new(
                    (index % ATLAS_COLUMNS) * TILE_SIZE,
                    (index / ATLAS_COLUMNS) * TILE_SIZE,
                    TILE_SIZE,
                    TILE_SIZE,
                );
                let (x, y) = cell_origin(cell);
                blit(&mut img, atlas, rect, x, y);
            }
        }

        // 3. 物件层
        for layer in 0..OBJECT_LAYERS {
            for cell in 0..CELL_COUNT {
                let (x, y) = cell_origin(cell);
                match self.object_draw(screen.object(layer, cell)) {
                    Some(ObjectDraw::Standard { bank, id }) => {
                        if let Some(src) = cache.get(&ResourceKind::Object { bank, id }) {
                            blit(&mut img, src, Rect::of(src), x, y);
                        }
                    }
                    Some(ObjectDraw::Custom(custom)) => {
                        let Some(src) = cache.get(&ResourceKind::Custom(custom.image.clone())) else {
                            continue;
                        };
                        // 参数溢出时整个物件不绘制
                        let placement = custom_frame(custom, src.width())
                            .zip(x.checked_add(custom.offset_x))
                            .zip(y.checked_add(custom.offset_y));
                        if let Some(((rect, dx), dy)) = placement {
                            blit(&mut img, src, rect, dx, dy);
                        }
                    }
                    None => {}
                }
            }
        }

        // 4. 坐标标签
        if self.options.coordinate_label {
            let text = format!("x{} y{}", screen.x(), screen.y());
            draw_label(&mut img, &text, LABEL_MARGIN, LABEL_MARGIN);
        }

        img
    }

    /// 决定格子绘制什么；None 表示空格子或被规则隐藏
    fn object_draw(&self, cell: ObjectCell) -> Option<ObjectDraw<'_>> {
        if cell.is_empty() {
            return None;
        }
        if cell.bank == CUSTOM_OBJECT_BANK {
            return self.custom_objects.get(&cell.id).map(ObjectDraw::Custom);
        }
        if !self.options.remove_debug_objects {
            return Some(ObjectDraw::Standard {
                bank: cell.bank,
                id: cell.id,
            });
        }

        let outcome = can_draw(cell.bank, cell.id, self.options.remove_ghost_objects);
        outcome.draw.then_some(ObjectDraw::Standard {
            bank: outcome.bank,
            id: outcome.id,
        })
    }
}

/// 图块值对应的图块集；0 号图块不绘制
fn tileset_for(screen: &Screen, value: u8) -> Option<ResourceKind> {
    if value % TILESET_B_FLAG == 0 {
        return None;
    }
    let setting = if value < TILESET_B_FLAG {
        ScreenSetting::TileSetA
    } else {
        ScreenSetting::TileSetB
    };
    Some(ResourceKind::Tileset(screen.setting(setting)))
}

fn cell_origin(cell: usize) -> (i32, i32) {
    let col = (cell % GRID_COLUMNS) as u32;
    let row = (cell / GRID_COLUMNS) as u32;
    ((col * TILE_SIZE) as i32, (row * TILE_SIZE) as i32)
}

/// 自定义物件初始帧在图片中的位置，超出 u32 范围时返回 None
fn custom_frame(custom: &CustomObject, image_width: u32) -> Option<Rect> {
    let columns = (image_width / custom.tile_width.max(1)).max(1);
    Some(Rect::new(
        (custom.init_frame % columns).checked_mul(custom.tile_width)?,
        (custom.init_frame / columns).checked_mul(custom.tile_height)?,
        custom.tile_width,
        custom.tile_height,
    ))
}
