//! 世界拼图

use image::{Rgba, RgbaImage};
use knytt_format::{Screen, World};
use rayon::prelude::*;
use tracing::debug;

use super::{Rect, SCREEN_HEIGHT, SCREEN_WIDTH, ScreenCompositor, blit};
use crate::resources::ImageCache;

/// 默认每行屏幕数
pub const DEFAULT_COLUMNS: u32 = 10;

/// RGBA 每像素字节数
const CHANNELS: usize = 4;

/// 世界拼图合成器
///
/// 按世界的迭代顺序逐行排列屏幕图片，与屏幕坐标无关。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldCompositor {
    columns: u32,
}

impl Default for WorldCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS)
    }
}

impl WorldCompositor {
    /// 每行 `columns` 个屏幕（至少 1 个）
    pub fn new(columns: u32) -> Self {
        Self {
            columns: columns.max(1),
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// 拼图尺寸（像素）
    pub fn mosaic_size(&self, screen_count: usize) -> (u32, u32) {
        if screen_count == 0 {
            return (0, 0);
        }
        let count = screen_count as u32;
        let columns = self.columns.min(count);
        let rows = count.div_ceil(self.columns);
        (columns * SCREEN_WIDTH, rows * SCREEN_HEIGHT)
    }

    /// 第 `slot` 个屏幕在拼图中的左上角
    pub fn slot_origin(&self, slot: usize) -> (u32, u32) {
        let slot = slot as u32;
        (
            (slot % self.columns) * SCREEN_WIDTH,
            (slot / self.columns) * SCREEN_HEIGHT,
        )
    }

    /// 把屏幕图片拼成一张图，第 i 张图片放在第 i 个位置
    pub fn render(&self, screen_images: &[RgbaImage]) -> RgbaImage {
        let (width, height) = self.mosaic_size(screen_images.len());
        let mut mosaic = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

        for (slot, img) in screen_images.iter().enumerate() {
            let (x, y) = self.slot_origin(slot);
            blit(&mut mosaic, img, Rect::of(img), x as i32, y as i32);
        }
        mosaic
    }

    /// 渲染整个世界并直接写入拼图
    ///
    /// 拼图按屏幕行切成互不重叠的行带，第 i 个屏幕写入第 i 个位置；
    /// 同一时刻只保留正在处理的行带的屏幕图片。
    pub fn render_world(
        &self,
        world: &World,
        compositor: &ScreenCompositor,
        cache: &ImageCache,
        parallel: bool,
    ) -> RgbaImage {
        let (width, height) = self.mosaic_size(world.len());
        let mut mosaic = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        if world.is_empty() {
            return mosaic;
        }

        let columns = self.columns as usize;
        let band_len = width as usize * SCREEN_HEIGHT as usize * CHANNELS;
        let render = |screen: &Screen| {
            debug!(x = screen.x(), y = screen.y(), "合成屏幕");
            compositor.render(screen, cache)
        };
        let fill_band = |(row, band): (usize, &mut [u8])| {
            let start = row * columns;
            let screens = &world.screens()[start..(start + columns).min(world.len())];
            let images: Vec<RgbaImage> = if parallel {
                screens.par_iter().map(&render).collect()
            } else {
                screens.iter().map(&render).collect()
            };
            for (column, img) in images.iter().enumerate() {
                copy_into_band(band, width, column, img);
            }
        };

        if parallel {
            mosaic.par_chunks_mut(band_len).enumerate().for_each(fill_band);
        } else {
            mosaic.chunks_mut(band_len).enumerate().for_each(fill_band);
        }
        mosaic
    }
}

/// 把一张屏幕图片逐行拷贝到行带的第 `column` 格
fn copy_into_band(band: &mut [u8], mosaic_width: u32, column: usize, img: &RgbaImage) {
    let stride = mosaic_width as usize * CHANNELS;
    let row_len = SCREEN_WIDTH as usize * CHANNELS;
    let offset = column * row_len;
    for (row, src) in img.as_raw().chunks_exact(row_len).enumerate() {
        let start = row * stride + offset;
        band[start..start + row_len].copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::RenderOptions;
    use crate::resources::ResourceKind;
    use knytt_format::ScreenSetting;

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Rgba(color))
    }

    /// 每个屏幕用不同的渐变，纯色即可区分
    fn gradient_world(count: u8) -> (World, ImageCache) {
        let world = World::from_screens((0..count).map(|i| {
            let mut screen = Screen::new(i as i32 * 7 - 20, 3 - i as i32);
            screen.set_setting(ScreenSetting::Gradient, i);
            screen
        }));
        let mut cache = ImageCache::new();
        for i in 0..count {
            cache.insert(
                ResourceKind::Gradient(i),
                RgbaImage::from_pixel(1, SCREEN_HEIGHT, Rgba([i * 40, 0, 0, 255])),
            );
        }
        (world, cache)
    }

    #[test]
    fn test_mosaic_size() {
        let compositor = WorldCompositor::new(10);
        assert_eq!(compositor.mosaic_size(0), (0, 0));
        assert_eq!(compositor.mosaic_size(3), (1800, 240));
        assert_eq!(compositor.mosaic_size(10), (6000, 240));
        assert_eq!(compositor.mosaic_size(11), (6000, 480));
        assert_eq!(WorldCompositor::new(0).columns(), 1);
    }

    #[test]
    fn test_render_row_major() {
        let compositor = WorldCompositor::new(2);
        let images = [
            solid([255, 0, 0, 255]),
            solid([0, 255, 0, 255]),
            solid([0, 0, 255, 255]),
        ];
        let mosaic = compositor.render(&images);

        assert_eq!(mosaic.dimensions(), (1200, 480));
        assert_eq!(mosaic.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(mosaic.get_pixel(600, 0).0, [0, 255, 0, 255]);
        assert_eq!(mosaic.get_pixel(0, 240).0, [0, 0, 255, 255]);
        // 空位保持黑色
        assert_eq!(mosaic.get_pixel(600, 240).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_render_world_slots() {
        let (world, cache) = gradient_world(5);
        let compositor = ScreenCompositor::new([], RenderOptions::default());
        let mosaic = WorldCompositor::new(2).render_world(&world, &compositor, &cache, true);

        assert_eq!(mosaic.dimensions(), (1200, 720));
        for slot in 0..5usize {
            let x = (slot as u32 % 2) * SCREEN_WIDTH;
            let y = (slot as u32 / 2) * SCREEN_HEIGHT;
            let expected = [slot as u8 * 40, 0, 0, 255];
            assert_eq!(mosaic.get_pixel(x, y).0, expected, "slot {slot}");
            assert_eq!(mosaic.get_pixel(x + 599, y + 239).0, expected, "slot {slot}");
        }
        assert_eq!(mosaic.get_pixel(600, 480).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (world, cache) = gradient_world(6);
        let compositor = ScreenCompositor::new([], RenderOptions::default());
        let mosaic = WorldCompositor::new(4);

        let serial = mosaic.render_world(&world, &compositor, &cache, false);
        let parallel = mosaic.render_world(&world, &compositor, &cache, true);
        assert_eq!(serial, parallel);

        // 与先渲染每个屏幕再拼图的结果一致
        let images: Vec<RgbaImage> = world.iter().map(|s| compositor.render(s, &cache)).collect();
        assert_eq!(parallel, mosaic.render(&images));
    }

    #[test]
    fn test_render_empty_world() {
        let compositor = ScreenCompositor::new([], RenderOptions::default());
        let mosaic = WorldCompositor::default().render_world(&World::new(), &compositor, &ImageCache::new(), true);
        assert_eq!(mosaic.dimensions(), (0, 0));
    }
}
