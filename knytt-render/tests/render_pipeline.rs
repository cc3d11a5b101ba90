//! 端到端：构造归档与共享资源，渲染并检查输出 PNG

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageOutputFormat, Rgba, RgbaImage};
use knytt_format::layout::encode_gzip;
use knytt_format::{ArchiveWriter, CUSTOM_OBJECT_BANK, Screen, ScreenSetting};
use knytt_render::{RenderConfig, RenderJob, ResourceKind};

const SKY: [u8; 4] = [10, 20, 30, 255];
const RED: [u8; 4] = [200, 0, 0, 255];
const GREEN: [u8; 4] = [0, 200, 0, 255];
const BLUE: [u8; 4] = [0, 0, 200, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba(color))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn write_asset(root: &Path, logical_path: &str, bytes: Vec<u8>) {
    let path = root.join(logical_path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// 两个屏幕：(0,0) 有渐变、图块、调试物件和自定义物件；(2,1) 为空
fn build_archive(dir: &Path) -> std::path::PathBuf {
    let mut first = Screen::new(0, 0);
    first
        .set_setting(ScreenSetting::Gradient, 1)
        .set_setting(ScreenSetting::TileSetA, 1)
        .set_tile(0, 0, 1)
        .set_object(0, 1, 15, 9)
        .set_object(0, 2, CUSTOM_OBJECT_BANK, 1)
        .set_object(1, 3, 15, 6);
    let second = Screen::new(2, 1);

    let mut writer = ArchiveWriter::new("Test World");
    writer
        .add("Map.bin", encode_gzip([&first, &second]).unwrap())
        .add(
            "World.ini",
            b"[World]\r\nName=Test World\r\n\r\n[Custom Object 1]\r\nImage=Eye.png\r\n".to_vec(),
        )
        .add("Custom Objects/Eye.png", png_bytes(24, 24, BLUE));

    let path = dir.join("Test World.knytt.bin");
    fs::write(&path, writer.finish()).unwrap();
    path
}

fn shared_assets(root: &Path) {
    write_asset(root, "Gradients/Gradient1.png", png_bytes(1, 240, SKY));
    write_asset(root, "Tilesets/Tileset1.png", png_bytes(384, 192, RED));
    write_asset(root, "Objects/Bank15/Object2.png", png_bytes(24, 24, GREEN));
    write_asset(root, "Objects/Bank15/Object6.png", png_bytes(24, 24, RED));
}

fn pixel(img: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
    img.get_pixel(x, y).0
}

fn check_mosaic(img: &RgbaImage) {
    assert_eq!(img.dimensions(), (1200, 240));
    // 屏幕 (0,0)
    assert_eq!(pixel(img, 5, 5), RED);
    assert_eq!(pixel(img, 30, 5), GREEN);
    assert_eq!(pixel(img, 53, 5), BLUE);
    // bank 15 id 6 被规则隐藏，露出渐变
    assert_eq!(pixel(img, 80, 5), SKY);
    assert_eq!(pixel(img, 300, 200), SKY);
    // 屏幕 (2,1) 在第二个位置，渐变 0 缺失
    assert_eq!(pixel(img, 650, 100), BLACK);
}

#[test]
fn test_render_extracted() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("Data");
    shared_assets(&assets);
    let archive = build_archive(dir.path());
    let out = dir.path().join("out");

    let report = RenderJob::new(&archive, &out, &assets, RenderConfig::default())
        .with_timestamp("20240102_030405")
        .run()
        .unwrap();

    assert_eq!(report.output, out.join("Test World_20240102_030405.png"));
    assert_eq!(report.world_name, "Test World");
    assert_eq!(report.screens, 2);
    assert_eq!(report.bounds.left, 0);
    assert_eq!(report.bounds.width, 3);
    assert_eq!(report.bounds.height, 2);
    assert_eq!(report.missing, vec![ResourceKind::Gradient(0)]);

    let world_dir = report.world_dir.unwrap();
    assert!(world_dir.join("Map.bin").is_file());
    assert!(world_dir.join("Custom Objects/Eye.png").is_file());

    check_mosaic(&image::open(&report.output).unwrap().to_rgba8());
}

#[test]
fn test_render_from_archive_matches_extracted() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("Data");
    shared_assets(&assets);
    let archive = build_archive(dir.path());
    let out = dir.path().join("out");

    let config = RenderConfig {
        extract: false,
        parallel: false,
        ..RenderConfig::default()
    };
    let report = RenderJob::new(&archive, &out, &assets, config)
        .with_timestamp("20240102_030405")
        .run()
        .unwrap();

    assert_eq!(report.world_dir, None);
    assert!(!out.join("Test World").exists());
    check_mosaic(&image::open(&report.output).unwrap().to_rgba8());
}

#[test]
fn test_columns_and_raw_objects() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("Data");
    shared_assets(&assets);
    let archive = build_archive(dir.path());

    let config = RenderConfig {
        mosaic_columns: 1,
        remove_debug_objects: false,
        ..RenderConfig::default()
    };
    let report = RenderJob::new(&archive, dir.path().join("out"), &assets, config)
        .with_timestamp("t")
        .run()
        .unwrap();
    assert_eq!(report.mosaic_size, (600, 480));

    let img = image::open(&report.output).unwrap().to_rgba8();
    // 不经过规则表：bank 15 id 6 原样绘制，id 9 的图片不存在
    assert_eq!(pixel(&img, 80, 5), RED);
    assert_eq!(pixel(&img, 30, 5), SKY);
    assert!(report.missing.contains(&ResourceKind::Object { bank: 15, id: 9 }));
}
