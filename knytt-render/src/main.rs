//! # Knytt Render
//!
//! ## 用法
//!
//! ```bash
//! knytt-render "Nifflas - The Machine.knytt.bin" out/ "C:/Knytt Stories/Data"
//! knytt-render world.knytt.bin out/ data/ --columns 8 --labels
//! knytt-render world.knytt.bin out/ data/ --config render.json --no-extract -v
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use knytt_render::{RenderConfig, RenderJob};
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "knytt-render")]
#[command(about = "把 Knytt 世界归档渲染为整张地图 PNG")]
#[command(version)]
struct Cli {
    /// 世界归档（.knytt.bin）
    archive: PathBuf,

    /// 输出目录
    output_dir: PathBuf,

    /// 共享资源根（包含 Gradients/、Tilesets/、Objects/）
    asset_root: PathBuf,

    /// 配置文件（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 拼图每行屏幕数
    #[arg(long)]
    columns: Option<u32>,

    /// 保留调试物件（不经过规则表）
    #[arg(long)]
    keep_debug_objects: bool,

    /// 隐藏幽灵物件
    #[arg(long)]
    remove_ghosts: bool,

    /// 绘制屏幕坐标
    #[arg(long)]
    labels: bool,

    /// 不解包，直接从归档读取世界资源
    #[arg(long)]
    no_extract: bool,

    /// 串行合成
    #[arg(long)]
    serial: bool,

    /// 日志详细程度（-v debug，-vv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// 命令行参数覆盖配置文件
    fn merge_into(&self, mut config: RenderConfig) -> RenderConfig {
        if let Some(columns) = self.columns {
            config.mosaic_columns = columns;
        }
        if self.keep_debug_objects {
            config.remove_debug_objects = false;
        }
        if self.remove_ghosts {
            config.remove_ghost_objects = true;
        }
        if self.labels {
            config.coordinate_labels = true;
        }
        if self.no_extract {
            config.extract = false;
        }
        if self.serial {
            config.parallel = false;
        }
        config
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let base = match &cli.config {
        Some(path) => RenderConfig::load(path),
        None => RenderConfig::default(),
    };
    let config = cli.merge_into(base);

    let job = RenderJob::new(&cli.archive, &cli.output_dir, &cli.asset_root, config);
    let report = job
        .run()
        .with_context(|| format!("渲染 {} 失败", cli.archive.display()))?;

    info!(
        output = %report.output.display(),
        screens = report.screens,
        missing = report.missing.len(),
        "完成"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
