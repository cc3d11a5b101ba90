//! 坐标标签：内置 3×5 点阵字体，只覆盖坐标用到的字符。

use image::{Rgba, RgbaImage};

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const SCALE: u32 = 2;
/// 字间距（缩放前）
const SPACING: u32 = 1;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 每行 3 位，高位在左
fn glyph(c: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    Some(match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        'x' => [0b000, 0b101, 0b010, 0b101, 0b000],
        'y' => [0b101, 0b101, 0b011, 0b001, 0b110],
        ' ' => [0; 5],
        _ => return None,
    })
}

/// 在 `(x, y)` 处绘制文本（带 1 像素阴影），不支持的字符跳过
pub fn draw_label(img: &mut RgbaImage, text: &str, x: u32, y: u32) {
    let mut cursor = x;
    for c in text.chars() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        draw_glyph(img, &rows, cursor + 1, y + 1, SHADOW_COLOR);
        draw_glyph(img, &rows, cursor, y, TEXT_COLOR);
        cursor += (GLYPH_WIDTH + SPACING) * SCALE;
    }
}

fn draw_glyph(img: &mut RgbaImage, rows: &[u8; GLYPH_HEIGHT as usize], x: u32, y: u32, color: Rgba<u8>) {
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            for dy in 0..SCALE {
                for dx in 0..SCALE {
                    let px = x + col * SCALE + dx;
                    let py = y + row as u32 * SCALE + dy;
                    if px < img.width() && py < img.height() {
                        img.put_pixel(px, py, color);
                    }
                }
            }
        }
    }
}
