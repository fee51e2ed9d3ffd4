use std::process::ExitCode;

use clap::{builder::RangedU64ValueParser, Parser};
use colored::*;
use minivfs::{
    disk::{
        init::{perform_disk_initialization, recover_from_corruption, BootProgress},
        BLOCK_SIZE, TOTAL_BLOCKS,
    },
    fs::config::DEFAULT_DISK_PATH,
    shell::{boot, run_script, start_shell},
    DiskConfig, FileDisk, FileSystem, FileSystemError,
};
use tracing::warn;

/// 基于 JSON 快照的迷你虚拟文件系统
#[derive(Debug, Parser)]
#[command(name = "minivfs", version, about)]
struct Args {
    /// 快照文件路径
    #[arg(long, default_value = DEFAULT_DISK_PATH)]
    disk: String,

    /// 每块最多字符数
    #[arg(long, default_value_t = BLOCK_SIZE, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    block_size: usize,

    /// 块总数
    #[arg(long, default_value_t = TOTAL_BLOCKS, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    total_blocks: usize,

    /// 非交互执行的命令，可重复
    #[arg(long = "exec", short = 'e', value_name = "COMMAND")]
    exec: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = DiskConfig::new(args.block_size, args.total_blocks);
    let file_disk = FileDisk::new(&args.disk);

    if args.exec.is_empty() {
        match boot(&file_disk, &config) {
            Ok(fs) => {
                start_shell(fs, &file_disk);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{} {}", "❌ Error:".red().bold(), e);
                ExitCode::FAILURE
            }
        }
    } else {
        let mut fs = match mount_quietly(&file_disk, &config) {
            Ok(fs) => fs,
            Err(e) => {
                eprintln!("{} {}", "❌ Error:".red().bold(), e);
                return ExitCode::FAILURE;
            }
        };
        if run_script(&mut fs, &file_disk, &args.exec) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// 脚本模式下没人可以确认，损坏的快照直接挪开
fn mount_quietly(file_disk: &FileDisk, config: &DiskConfig) -> minivfs::Result<FileSystem> {
    match perform_disk_initialization(file_disk, config, &mut |_: BootProgress| {}) {
        Err(FileSystemError::CorruptState(reason)) => {
            warn!(%reason, "snapshot corrupted");
            let (fs, backup) = recover_from_corruption(file_disk, config)?;
            eprintln!(
                "{} {}",
                "⚠️  Corrupt snapshot kept at".yellow(),
                backup.display()
            );
            Ok(fs)
        }
        other => other,
    }
}
