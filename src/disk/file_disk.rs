use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    disk::{Disk, Snapshot},
    fs::{
        config::DiskConfig,
        error::{FileSystemError, Result},
    },
    utils::generate_uuid,
};

/// 快照文件：整盘状态以 JSON 保存，每次整体覆盖
#[derive(Debug, Clone)]
pub struct FileDisk {
    path: PathBuf,
}

impl FileDisk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// 读取快照；文件不存在时返回 `None`
    pub fn load(&self, config: &DiskConfig) -> Result<Option<Disk>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FileSystemError::CorruptState(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let snapshot: Snapshot = serde_json::from_str(&text).map_err(|e| {
            FileSystemError::CorruptState(format!("{}: {}", self.path.display(), e))
        })?;
        let disk = Disk::from_snapshot(snapshot, config)?;
        debug!(path = %self.path.display(), files = disk.files.len(), "snapshot loaded");
        Ok(Some(disk))
    }

    /// 先写临时文件再 rename，保证快照整体替换
    pub fn save(&self, disk: &Disk) -> Result<()> {
        let json = serde_json::to_string_pretty(&disk.to_snapshot())?;

        let tmp = self.temp_path();
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }

    /// 把损坏的快照改名为 `<path>.corrupt`，返回新路径
    pub fn quarantine(&self) -> Result<PathBuf> {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        let target = PathBuf::from(name);
        fs::rename(&self.path, &target)?;
        warn!(from = %self.path.display(), to = %target.display(), "corrupt snapshot moved aside");
        Ok(target)
    }

    /// 同目录下的临时文件名
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "disk".to_string());
        let tmp = format!(".{}.{}.tmp", file_name, generate_uuid());
        match self.path.parent() {
            Some(dir) => dir.join(tmp),
            None => PathBuf::from(tmp),
        }
    }

    /// 格式化一块新盘并立即落盘
    pub fn format(&self, config: &DiskConfig) -> Result<Disk> {
        let disk = Disk::format(config);
        self.save(&disk)?;
        info!(
            path = %self.path.display(),
            blocks = config.total_blocks,
            block_size = config.block_size,
            "formatted new disk"
        );
        Ok(disk)
    }
}
