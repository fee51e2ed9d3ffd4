use std::path::PathBuf;

use tracing::{info, warn};

use crate::{
    disk::FileDisk,
    fs::{config::DiskConfig, error::Result, FileSystem},
};

/// 启动过程中的进度通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootProgress {
    Step(&'static str),
    Progress(u64), // 0..=100
}

/// 挂载已有快照；没有快照时格式化一块新盘
///
/// 快照损坏时返回 `CorruptState`，由调用方决定是否走 [`recover_from_corruption`]。
pub fn perform_disk_initialization(
    file_disk: &FileDisk,
    config: &DiskConfig,
    report: &mut dyn FnMut(BootProgress),
) -> Result<FileSystem> {
    report(BootProgress::Step("🧠 Initializing virtual disk..."));
    report(BootProgress::Progress(10));

    let disk = match file_disk.load(config)? {
        Some(disk) => {
            report(BootProgress::Step("⚙️  Mounting file system..."));
            info!(path = %file_disk.path().display(), files = disk.files.len(), "disk mounted");
            disk
        }
        None => {
            // 只有“明确是新磁盘”才格式化
            report(BootProgress::Step(
                "🔧 No disk found, formatting new file system...",
            ));
            file_disk.format(config)?
        }
    };

    report(BootProgress::Progress(100));
    Ok(FileSystem::new(disk))
}

/// 把损坏的快照挪开并从空盘重新开始，返回备份路径
pub fn recover_from_corruption(
    file_disk: &FileDisk,
    config: &DiskConfig,
) -> Result<(FileSystem, PathBuf)> {
    let backup = file_disk.quarantine()?;
    let disk = file_disk.format(config)?;
    warn!(backup = %backup.display(), "started from a fresh disk");
    Ok((FileSystem::new(disk), backup))
}
