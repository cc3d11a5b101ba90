//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-format`: 运行 knytt-format 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `world-check`: 检查世界归档或地图文件（屏幕、边界、规则效果、自定义物件）

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use knytt_format::archive::MAGIC;
use knytt_format::layout::{self, MAP_FILE, WORLD_INI};
use knytt_format::{
    ArchiveReader, CELL_COUNT, CUSTOM_OBJECT_BANK, OBJECT_LAYERS, World, WorldIni, can_draw,
};
use serde_json::{Value, json};
use walkdir::WalkDir;

/// 覆盖率统计排除的工具 crate
const COVERAGE_EXCLUDES: [&str; 2] = ["xtask", "archive-packer"];

/// 覆盖率 HTML 报告位置
const COVERAGE_REPORT: &str = "target/llvm-cov/html/index.html";

/// 运行一条 cargo 命令，非零退出即失败
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let label = format!("cargo {}", args.join(" "));
    eprintln!("\n==> {label}");
    let status = Command::new("cargo").args(args).status()?;
    anyhow::ensure!(status.success(), "{label} 失败（{status}）");
    Ok(())
}

/// cargo-llvm-cov 未安装时给出安装步骤
fn require_llvm_cov() -> anyhow::Result<()> {
    let installed = Command::new("cargo")
        .args(["llvm-cov", "--version"])
        .output()
        .is_ok_and(|out| out.status.success());
    anyhow::ensure!(
        installed,
        "找不到 cargo llvm-cov，安装后重试：\n  \
         cargo install cargo-llvm-cov\n  \
         rustup component add llvm-tools-preview"
    );
    Ok(())
}

/// `cargo llvm-cov` 参数：指定 crate，或整个 workspace 去掉工具 crate
fn coverage_args(package: Option<&str>) -> Vec<&str> {
    let mut args = vec!["llvm-cov"];
    match package {
        Some(package) => args.extend(["-p", package]),
        None => {
            args.push("--workspace");
            for excluded in COVERAGE_EXCLUDES {
                args.extend(["--exclude", excluded]);
            }
        }
    }
    args.extend(["--all-features", "--html"]);
    args
}

fn coverage(package: Option<&str>) -> anyhow::Result<()> {
    require_llvm_cov()?;
    cargo(&coverage_args(package))?;
    eprintln!("\n覆盖率报告: {COVERAGE_REPORT}");
    Ok(())
}

fn main() -> ExitCode {
    match dispatch(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: Vec<String>) -> anyhow::Result<()> {
    let (command, rest) = args.split_first().map_or(("help", &[][..]), |(c, r)| (c.as_str(), r));

    match command {
        "check-all" => {
            cargo(&["fmt", "--all", "--", "--check"])?;
            cargo(&["clippy", "--workspace", "--all-targets"])?;
            cargo(&["test", "--workspace"])?;
        }
        "cov-format" => coverage(Some("knytt-format"))?,
        "cov-workspace" => coverage(None)?,
        "world-check" => {
            let as_json = rest.iter().any(|a| a == "--json");
            let path = rest.iter().find(|a| !a.starts_with("--"));
            world_check(path.map(String::as_str), as_json)?;
        }
        "help" | "-h" | "--help" => print_help(),
        other => anyhow::bail!("未知命令: {other}（cargo xtask help 查看用法）"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-format      运行 knytt-format 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  world-check     检查世界归档或地图文件

WORLD-CHECK:
  cargo xtask world-check [path] [--json]

  不带参数：检查 worlds/ 下所有 .knytt.bin 归档
  带路径参数：检查指定归档、Map.bin 或目录

  检查内容：
    - 归档/地图能否解码，头部文件数是否一致
    - 屏幕数量与世界边界
    - 规则表隐藏与重定向的物件数量
    - 引用了未定义的自定义物件、自定义物件图片缺失

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-format    -> cargo xtask cov-format
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo world-check   -> cargo xtask world-check
"#
    );
}

//=============================================================================
// world-check 命令实现
//=============================================================================

/// 默认检查目录（相对于 workspace root）
const DEFAULT_WORLDS_DIR: &str = "worlds";

/// 归档文件后缀
const ARCHIVE_SUFFIX: &str = ".knytt.bin";

/// 单个世界的检查结果
#[derive(Debug, Default)]
struct WorldCheck {
    source: String,
    root_name: Option<String>,
    declared_count: Option<u32>,
    file_count: Option<usize>,
    screens: usize,
    bounds: Value,
    name: String,
    author: String,
    /// 被规则隐藏的物件格子数
    hidden_objects: usize,
    /// 被规则重定向的物件格子数
    remapped_objects: usize,
    /// 地图中引用但 World.ini 未定义的自定义物件 id
    undefined_custom: BTreeSet<u8>,
    /// 已定义但找不到图片的自定义物件图片
    missing_custom_images: BTreeSet<String>,
}

impl WorldCheck {
    fn has_errors(&self) -> bool {
        !self.undefined_custom.is_empty() || !self.missing_custom_images.is_empty()
    }

    fn has_count_mismatch(&self) -> bool {
        matches!(
            (self.declared_count, self.file_count),
            (Some(declared), Some(actual)) if declared as usize != actual
        )
    }

    fn to_json(&self) -> Value {
        json!({
            "source": self.source,
            "root_name": self.root_name,
            "declared_count": self.declared_count,
            "file_count": self.file_count,
            "screens": self.screens,
            "bounds": self.bounds,
            "name": self.name,
            "author": self.author,
            "hidden_objects": self.hidden_objects,
            "remapped_objects": self.remapped_objects,
            "undefined_custom": self.undefined_custom,
            "missing_custom_images": self.missing_custom_images,
        })
    }
}

/// 执行世界检查
fn world_check(path: Option<&str>, as_json: bool) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_world_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_WORLDS_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认世界目录不存在: {}\n请在 workspace 根目录运行，或指定路径",
                    dir.display()
                );
            }
            collect_world_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到世界文件（{ARCHIVE_SUFFIX} 或 {MAP_FILE}）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个世界...\n", files.len());

    let mut checks = Vec::new();
    let mut failures = 0;
    for file in &files {
        match check_world_file(file) {
            Ok(check) => checks.push(check),
            Err(e) => {
                eprintln!("[ERROR] {}: {e:#}", file.display());
                failures += 1;
            }
        }
    }

    if as_json {
        let report: Vec<Value> = checks.iter().map(WorldCheck::to_json).collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_check_result(&checks, failures);
    }

    if failures > 0 || checks.iter().any(WorldCheck::has_errors) {
        anyhow::bail!("世界检查发现错误");
    }
    Ok(())
}

/// 收集目录下的归档与地图文件
fn collect_world_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            name.ends_with(ARCHIVE_SUFFIX) || name.eq_ignore_ascii_case(MAP_FILE)
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// 检查单个文件：NF 开头按归档处理，否则按地图处理
fn check_world_file(file: &Path) -> anyhow::Result<WorldCheck> {
    let bytes = fs::read(file)?;
    let source = file.display().to_string();

    if bytes.starts_with(&MAGIC) {
        let archive = ArchiveReader::parse(&bytes)?;
        let map_path = archive
            .find_ignore_case(MAP_FILE)
            .ok_or_else(|| anyhow::anyhow!("归档中没有 {MAP_FILE}"))?;
        let world = layout::decode(archive.get_file(map_path)?)?;
        let ini = archive
            .find_ignore_case(WORLD_INI)
            .and_then(|p| archive.get_file(p).ok())
            .map(WorldIni::from_bytes)
            .unwrap_or_default();

        let mut check = analyze_world(&world, &ini, |image| {
            archive
                .find_ignore_case(&format!("Custom Objects/{image}"))
                .is_some()
        });
        check.source = source;
        check.root_name = Some(archive.root_name().to_string());
        check.declared_count = Some(archive.declared_count());
        check.file_count = Some(archive.file_count());
        Ok(check)
    } else {
        let world = layout::load(file)?;
        let ini_path = file.with_file_name(WORLD_INI);
        let ini = if ini_path.exists() {
            WorldIni::load(&ini_path)?
        } else {
            WorldIni::default()
        };
        let custom_dir = file.with_file_name("Custom Objects");

        let mut check = analyze_world(&world, &ini, |image| custom_dir.join(image).is_file());
        check.source = source;
        Ok(check)
    }
}

/// 统计屏幕、规则效果与自定义物件
fn analyze_world(world: &World, ini: &WorldIni, image_exists: impl Fn(&str) -> bool) -> WorldCheck {
    let mut check = WorldCheck {
        screens: world.len(),
        bounds: serde_json::to_value(world.bounds()).unwrap_or(Value::Null),
        name: world.metadata().name.clone(),
        author: world.metadata().author.clone(),
        ..WorldCheck::default()
    };
    if check.name.is_empty() {
        let metadata = ini.metadata();
        check.name = metadata.name;
        check.author = metadata.author;
    }

    for screen in world {
        for layer in 0..OBJECT_LAYERS {
            for cell in 0..CELL_COUNT {
                let object = screen.object(layer, cell);
                if object.is_empty() {
                    continue;
                }
                if object.bank == CUSTOM_OBJECT_BANK {
                    match ini.custom_object(object.id) {
                        Some(custom) if !image_exists(&custom.image) => {
                            check.missing_custom_images.insert(custom.image);
                        }
                        Some(_) => {}
                        None => {
                            check.undefined_custom.insert(object.id);
                        }
                    }
                    continue;
                }

                let outcome = can_draw(object.bank, object.id, false);
                if !outcome.draw {
                    check.hidden_objects += 1;
                } else if (outcome.bank, outcome.id) != (object.bank, object.id) {
                    check.remapped_objects += 1;
                }
            }
        }
    }
    check
}

/// 输出检查结果
fn print_check_result(checks: &[WorldCheck], failures: usize) {
    for check in checks {
        eprintln!("─────────────────────────────────────────────────────");
        eprintln!("{}", check.source);
        if let Some(root) = &check.root_name {
            eprintln!("  根名称: {root}");
        }
        if !check.name.is_empty() {
            eprintln!("  世界: {} / {}", check.name, check.author);
        }
        eprintln!("  屏幕: {}  边界: {}", check.screens, check.bounds);
        eprintln!(
            "  规则: 隐藏 {} 个物件，重定向 {} 个物件",
            check.hidden_objects, check.remapped_objects
        );
        if check.has_count_mismatch() {
            eprintln!(
                "[WARN] 头部声明 {:?} 个文件，实际 {:?} 个",
                check.declared_count, check.file_count
            );
        }
        for id in &check.undefined_custom {
            eprintln!("[ERROR] 自定义物件 {id} 未在 World.ini 中定义");
        }
        for image in &check.missing_custom_images {
            eprintln!("[ERROR] 自定义物件图片不存在: {image}");
        }
    }

    let errors = failures + checks.iter().filter(|c| c.has_errors()).count();
    eprintln!();
    if errors > 0 {
        eprintln!("❌ {} 个世界有错误", errors);
    } else {
        eprintln!("✅ 检查通过，共 {} 个世界", checks.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knytt_format::{ArchiveWriter, Screen};

    #[test]
    fn test_coverage_args() {
        assert_eq!(
            coverage_args(Some("knytt-format")),
            ["llvm-cov", "-p", "knytt-format", "--all-features", "--html"]
        );
        assert_eq!(
            coverage_args(None),
            [
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--exclude",
                "archive-packer",
                "--all-features",
                "--html"
            ]
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = dispatch(vec!["bogus".to_string()]).unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(dispatch(Vec::new()).is_ok());
    }

    fn sample_screen() -> Screen {
        let mut screen = Screen::new(0, 0);
        screen
            // 隐藏
            .set_object(0, 0, 0, 2)
            // 重定向到 (15, 2)
            .set_object(0, 1, 15, 9)
            // 原样绘制
            .set_object(0, 2, 0, 1)
            .set_object(1, 0, CUSTOM_OBJECT_BANK, 1)
            .set_object(1, 1, CUSTOM_OBJECT_BANK, 2)
            .set_object(1, 2, CUSTOM_OBJECT_BANK, 3);
        screen
    }

    #[test]
    fn test_analyze_world() {
        let world = World::from_screens([sample_screen(), Screen::new(3, -1)]);
        let ini = WorldIni::parse(
            "[World]\nName=Sample\n[Custom Object 1]\nImage=Eye.png\n[Custom Object 2]\nImage=Lamp.png\n",
        );

        let check = analyze_world(&world, &ini, |image| image == "Eye.png");
        assert_eq!(check.screens, 2);
        assert_eq!(check.name, "Sample");
        assert_eq!(check.hidden_objects, 1);
        assert_eq!(check.remapped_objects, 1);
        assert_eq!(check.undefined_custom, BTreeSet::from([3]));
        assert_eq!(check.missing_custom_images, BTreeSet::from(["Lamp.png".to_string()]));
        assert!(check.has_errors());
        assert_eq!(check.to_json()["bounds"]["width"], 4);
    }

    #[test]
    fn test_check_archive_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArchiveWriter::new("Sample");
        writer
            .add(MAP_FILE, layout::encode_gzip([&sample_screen()]).unwrap())
            .add(
                WORLD_INI,
                b"[Custom Object 1]\nImage=Eye.png\n[Custom Object 2]\nImage=Lamp.png\n[Custom Object 3]\nImage=Eye.png\n".to_vec(),
            )
            .add("Custom Objects/Eye.png", b"png".to_vec())
            .add("Custom Objects/Lamp.png", b"png".to_vec());
        let path = dir.path().join("sample.knytt.bin");
        fs::write(&path, writer.finish()).unwrap();

        assert_eq!(collect_world_files(dir.path()), vec![path.clone()]);

        let check = check_world_file(&path).unwrap();
        assert_eq!(check.root_name.as_deref(), Some("Sample"));
        assert_eq!(check.file_count, Some(4));
        assert!(!check.has_count_mismatch());
        assert!(!check.has_errors());
    }

    #[test]
    fn test_check_layout_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MAP_FILE);
        fs::write(&path, layout::encode(&[Screen::new(1, 1)])).unwrap();

        let check = check_world_file(&path).unwrap();
        assert_eq!(check.screens, 1);
        assert_eq!(check.root_name, None);
    }
}
