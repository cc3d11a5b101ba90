//! # Compositor 模块
//!
//! 把屏幕数据合成为像素。
//!
//! - [`ScreenCompositor`]：单个屏幕 → 600×240 图片
//! - [`WorldCompositor`]：所有屏幕图片 → 拼图
//!
//! 所有资源图片共用同一个透明色键（品红 `#FF00FF`），
//! 色键像素与完全透明的像素都不会被绘制。

mod label;
mod screen;
mod world;

pub use label::draw_label;
pub use screen::{RenderOptions, ScreenCompositor};
pub use world::WorldCompositor;

use image::{Rgba, RgbaImage};
use knytt_format::{GRID_COLUMNS, GRID_ROWS, TILE_SIZE};

/// 屏幕像素宽度
pub const SCREEN_WIDTH: u32 = GRID_COLUMNS as u32 * TILE_SIZE;
/// 屏幕像素高度
pub const SCREEN_HEIGHT: u32 = GRID_ROWS as u32 * TILE_SIZE;

/// 图块集每行的图块数
pub const ATLAS_COLUMNS: u32 = 16;

/// 透明色键
pub const COLOR_KEY: [u8; 3] = [255, 0, 255];

/// 源矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// 整张图片
    pub fn of(img: &RgbaImage) -> Self {
        Self::new(0, 0, img.width(), img.height())
    }
}

/// 把 `src` 的 `rect` 区域绘制到 `dst` 的 `(dx, dy)`
///
/// 超出任一图片边界的部分被裁掉。
pub fn blit(dst: &mut RgbaImage, src: &RgbaImage, rect: Rect, dx: i32, dy: i32) {
    let x_end = rect.x.saturating_add(rect.width).min(src.width());
    let y_end = rect.y.saturating_add(rect.height).min(src.height());

    for sy in rect.y..y_end {
        let ty = dy as i64 + (sy - rect.y) as i64;
        if ty < 0 || ty >= dst.height() as i64 {
            continue;
        }
        for sx in rect.x..x_end {
            let tx = dx as i64 + (sx - rect.x) as i64;
            if tx < 0 || tx >= dst.width() as i64 {
                continue;
            }
            let pixel = *src.get_pixel(sx, sy);
            if is_transparent(pixel) {
                continue;
            }
            let target = dst.get_pixel_mut(tx as u32, ty as u32);
            *target = blend(*target, pixel);
        }
    }
}

fn is_transparent(pixel: Rgba<u8>) -> bool {
    pixel.0[3] == 0 || pixel.0[..3] == COLOR_KEY
}

/// source-over 混合
fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as u32;
    if sa == 255 {
        return src;
    }
    let da = dst.0[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let s = src.0[i] as u32 * sa;
        let d = dst.0[i] as u32 * da * (255 - sa) / 255;
        ((s + d) / out_a) as u8
    };
    Rgba([channel(0), channel(1), channel(2), out_a as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const KEY: Rgba<u8> = Rgba([255, 0, 255, 255]);

    #[test]
    fn test_screen_size() {
        assert_eq!((SCREEN_WIDTH, SCREEN_HEIGHT), (600, 240));
    }

    #[test]
    fn test_blit_skips_color_key() {
        let mut dst = RgbaImage::from_pixel(2, 1, BLUE);
        let mut src = RgbaImage::from_pixel(2, 1, RED);
        src.put_pixel(1, 0, KEY);

        blit(&mut dst, &src, Rect::of(&src), 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), RED);
        assert_eq!(*dst.get_pixel(1, 0), BLUE);
    }

    #[test]
    fn test_blit_skips_transparent() {
        let mut dst = RgbaImage::from_pixel(1, 1, BLUE);
        let src = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 0]));
        blit(&mut dst, &src, Rect::of(&src), 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), BLUE);
    }

    #[test]
    fn test_blit_source_rect_and_clipping() {
        let mut src = RgbaImage::from_pixel(4, 4, BLUE);
        src.put_pixel(2, 3, RED);
        let mut dst = RgbaImage::new(3, 3);

        // 源区域 (2,2) 起 2×2，绘制到 (-1, 1)：只有右半列落入目标
        blit(&mut dst, &src, Rect::new(2, 2, 2, 2), -1, 1);
        assert_eq!(*dst.get_pixel(0, 1), BLUE);
        assert_eq!(*dst.get_pixel(0, 2), BLUE);
        assert_eq!(dst.get_pixel(1, 1).0[3], 0);

        // 源区域越界部分被裁掉
        let mut dst = RgbaImage::new(3, 3);
        blit(&mut dst, &src, Rect::new(3, 3, 5, 5), 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), BLUE);
        assert_eq!(dst.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn test_blit_rect_near_u32_max() {
        let src = RgbaImage::from_pixel(2, 2, RED);
        let mut dst = RgbaImage::from_pixel(2, 2, BLUE);

        blit(&mut dst, &src, Rect::new(1, 1, u32::MAX, u32::MAX), 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), RED);
        assert_eq!(*dst.get_pixel(1, 0), BLUE);

        // 起点在图片之外，什么都不画
        let mut dst = RgbaImage::from_pixel(2, 2, BLUE);
        blit(&mut dst, &src, Rect::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX), 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), BLUE);
    }

    #[test]
    fn test_blend_half_alpha() {
        let out = blend(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out.0[3], 255);
        assert!((127..=129).contains(&out.0[0]));
    }
}
