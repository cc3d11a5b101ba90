//! # Archive Packer
//!
//! 归档打包工具 - 将世界目录打包为 `.knytt.bin` 归档，或检查、解包已有归档。
//!
//! ## 用法
//!
//! ```bash
//! # 在项目根目录使用 cargo 运行
//! cargo run -p archive-packer -- --input "Worlds/Nifflas - The Machine" --output machine.knytt.bin
//! cargo run -p archive-packer -- list machine.knytt.bin
//! cargo run -p archive-packer -- list machine.knytt.bin --filter "Custom Objects"
//! cargo run -p archive-packer -- verify machine.knytt.bin --input "Worlds/Nifflas - The Machine"
//! cargo run -p archive-packer -- extract machine.knytt.bin --output-dir out
//!
//! # 或安装后直接使用
//! cargo install --path tools/archive-packer
//! packer --input "Worlds/Nifflas - The Machine" --output machine.knytt.bin
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use knytt_format::{ArchiveReader, ArchiveWriter};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "packer")]
#[command(about = "归档打包工具 - 将世界目录打包为 .knytt.bin 归档")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 输入目录（默认：world）
    #[arg(short, long, default_value = "world", global = true)]
    input: PathBuf,

    /// 输出归档（默认：world.knytt.bin）
    #[arg(short, long, default_value = "world.knytt.bin", global = true)]
    output: PathBuf,

    /// 归档根名称（默认：输入目录名）
    #[arg(short, long, global = true)]
    root: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出归档内容
    List {
        /// 归档路径
        archive: PathBuf,

        /// 只列出包含该子串的路径
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// 验证归档可读，并可与原始目录对比
    Verify {
        /// 归档路径
        archive: PathBuf,

        /// 原始目录（用于对比）
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// 解包到 `<output-dir>/<root>/`
    Extract {
        /// 归档路径
        archive: PathBuf,

        /// 输出目录（默认：当前目录）
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let (step, result) = match cli.command {
        None => ("打包", pack_world(&cli.input, &cli.output, cli.root.as_deref())),
        Some(Commands::List { archive, filter }) => ("列出", list_archive(&archive, filter.as_deref())),
        Some(Commands::Verify { archive, input }) => {
            ("验证", verify_archive(&archive, input.as_deref()))
        }
        Some(Commands::Extract { archive, output_dir }) => {
            ("解包", extract_archive(&archive, &output_dir))
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {step}失败: {e:#}");
        std::process::exit(1);
    }
}

/// 收集目录下的所有文件，返回（虚拟路径，文件路径），按虚拟路径排序
fn collect_files(input: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();

        // 跳过目录
        if !entry.file_type().is_file() {
            continue;
        }

        let relative_path = path.strip_prefix(input)?;
        let name = relative_path.to_string_lossy().replace('\\', "/");
        files.push((name, path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// 打包目录到归档
fn pack_world(input: &Path, output: &Path, root: Option<&str>) -> Result<()> {
    println!("📦 打包世界目录: {:?} -> {:?}", input, output);

    if !input.is_dir() {
        bail!("输入目录不存在: {:?}", input);
    }

    let root_name = match root {
        Some(root) => root.to_string(),
        None => input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .context("无法从输入目录推断归档根名称，请使用 --root 指定")?,
    };

    let mut writer = ArchiveWriter::new(&root_name);
    let mut total_size = 0u64;

    for (name, path) in collect_files(input)? {
        let content = fs::read(&path).with_context(|| format!("读取 {:?} 失败", path))?;
        total_size += content.len() as u64;
        println!("  + {} ({})", name, format_size(content.len() as u64));
        writer.add(&name, content);
    }

    let bytes = writer.finish();
    fs::write(output, &bytes).with_context(|| format!("写出 {:?} 失败", output))?;

    println!();
    println!("✅ 打包完成！");
    println!("   根名称: {}", root_name);
    println!("   文件数: {}", writer.len());
    println!("   原始大小: {}", format_size(total_size));
    println!("   归档大小: {}", format_size(bytes.len() as u64));
    println!("   输出文件: {:?}", output);

    Ok(())
}

/// 列出归档内容
fn list_archive(archive_path: &Path, filter: Option<&str>) -> Result<()> {
    let archive = ArchiveReader::open(archive_path)?;

    println!("📋 归档内容: {:?}", archive_path);
    println!("   根名称: {}", archive.root_name());
    println!();

    println!("{:<60} {:>12}", "文件名", "大小");
    println!("{}", "-".repeat(73));

    let mut total_size = 0u64;
    let files = archive.list_files(filter);
    for name in &files {
        let size = archive.get_file_size(name)? as u64;
        total_size += size;
        println!("{:<60} {:>12}", name, format_size(size));
    }

    println!("{}", "-".repeat(73));
    println!(
        "{:<60} {:>12}",
        format!("共 {} 个文件", files.len()),
        format_size(total_size)
    );

    if archive.declared_count() as usize != archive.file_count() {
        println!(
            "⚠️  头部声明 {} 个文件，实际 {} 个",
            archive.declared_count(),
            archive.file_count()
        );
    }

    Ok(())
}

/// 验证归档
///
/// 返回发现的问题列表；提供原始目录时逐个对比内容。
fn verify_entries(archive: &ArchiveReader, input: Option<&Path>) -> Result<Vec<String>> {
    let mut errors = Vec::new();

    if archive.declared_count() as usize != archive.file_count() {
        errors.push(format!(
            "头部声明 {} 个文件，实际 {} 个",
            archive.declared_count(),
            archive.file_count()
        ));
    }

    let Some(input_dir) = input else {
        return Ok(errors);
    };

    for (name, path) in collect_files(input_dir)? {
        match archive.get_file(&name) {
            Ok(content) => {
                if fs::read(&path)? != content {
                    errors.push(format!("{}: 内容不一致", name));
                }
            }
            Err(_) => errors.push(format!("{}: 归档中缺失", name)),
        }
    }

    Ok(errors)
}

fn verify_archive(archive_path: &Path, input: Option<&Path>) -> Result<()> {
    println!("🔍 验证归档: {:?}", archive_path);

    let archive = ArchiveReader::open(archive_path)?;
    let errors = verify_entries(&archive, input)?;

    if errors.is_empty() {
        println!("✅ 验证通过！共 {} 个文件", archive.file_count());
        Ok(())
    } else {
        println!("❌ 验证失败！发现 {} 个问题:", errors.len());
        for error in &errors {
            println!("   - {}", error);
        }
        bail!("{} 个问题", errors.len())
    }
}

/// 解包归档
fn extract_archive(archive_path: &Path, output_dir: &Path) -> Result<()> {
    println!("📂 解包归档: {:?} -> {:?}", archive_path, output_dir);

    let archive = ArchiveReader::open(archive_path)?;
    let world_dir = archive.save_all(output_dir)?;

    println!("✅ 解包完成！共 {} 个文件", archive.file_count());
    println!("   输出目录: {:?}", world_dir);
    Ok(())
}

/// 格式化文件大小
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
