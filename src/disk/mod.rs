pub mod block_store;
pub mod file_disk;
pub mod init;
pub mod types;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use block_store::BlockStore;
pub use file_disk::FileDisk;
pub use types::{Block, BlockId, BLOCK_SIZE, TOTAL_BLOCKS};

use crate::{
    fs::{
        allocator::Strategy,
        config::DiskConfig,
        error::{FileSystemError, Result},
        file_table::FileTable,
    },
    utils::current_timestamp,
};

/// 磁盘元信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskMeta {
    pub created: f64, // 创建时间，Unix 秒
}

impl DiskMeta {
    pub fn now() -> Self {
        Self {
            created: current_timestamp(),
        }
    }
}

/// 整个虚拟磁盘：块区 + 文件表 + 当前策略
#[derive(Debug, Clone, PartialEq)]
pub struct Disk {
    pub blocks: BlockStore,
    pub files: FileTable,
    pub strategy: Strategy,
    pub meta: DiskMeta,
}

/// 持久化快照的 JSON 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    pub files: BTreeMap<String, Vec<BlockId>>,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "DiskMeta::now")]
    pub meta: DiskMeta,
}

impl Disk {
    /// 格式化出一块空盘
    pub fn format(config: &DiskConfig) -> Self {
        Self {
            blocks: BlockStore::new(config.total_blocks, config.block_size),
            files: FileTable::new(),
            strategy: Strategy::default(),
            meta: DiskMeta::now(),
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self.blocks.slots().to_vec(),
            files: self
                .files
                .list()
                .into_iter()
                .map(|(path, blocks)| (path.to_string(), blocks.to_vec()))
                .collect(),
            strategy: self.strategy,
            meta: self.meta,
        }
    }

    /// 从快照恢复，任何不一致都视为 CorruptState
    pub fn from_snapshot(snapshot: Snapshot, config: &DiskConfig) -> Result<Self> {
        let corrupt = |msg: String| FileSystemError::CorruptState(msg);

        if snapshot.blocks.len() != config.total_blocks {
            return Err(corrupt(format!(
                "expected {} blocks, found {}",
                config.total_blocks,
                snapshot.blocks.len()
            )));
        }

        let blocks = BlockStore::from_slots(snapshot.blocks, config.block_size)
            .map_err(|e| corrupt(e.to_string()))?;

        let mut owner: Vec<Option<&str>> = vec![None; blocks.len()];
        for (path, indices) in &snapshot.files {
            for &index in indices {
                if index >= blocks.len() {
                    return Err(corrupt(format!("{path} references block {index}")));
                }
                if let Some(other) = owner[index] {
                    return Err(corrupt(format!(
                        "block {index} is owned by both {other} and {path}"
                    )));
                }
                if !blocks.is_used(index) {
                    return Err(corrupt(format!("{path} references empty block {index}")));
                }
                owner[index] = Some(path.as_str());
            }
        }

        // 有内容的块必须属于某个文件，否则永远无法释放
        if let Some(orphan) = (0..blocks.len()).find(|&i| blocks.is_used(i) && owner[i].is_none()) {
            return Err(corrupt(format!("block {orphan} holds data but no file owns it")));
        }

        Ok(Self {
            blocks,
            files: snapshot.files.into_iter().collect(),
            strategy: snapshot.strategy,
            meta: snapshot.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> DiskConfig {
        DiskConfig::new(4, 6)
    }

    fn snapshot_json(json: &str) -> Snapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn snapshot_round_trip() {
        let mut disk = Disk::format(&small());
        disk.blocks.set(2, Some("abcd".into())).unwrap();
        disk.blocks.set(4, Some("e".into())).unwrap();
        disk.files.set("notes", vec![2, 4]);
        disk.strategy = Strategy::BestFit;

        let restored = Disk::from_snapshot(disk.to_snapshot(), &small()).unwrap();
        assert_eq!(restored, disk);
    }

    #[test]
    fn snapshot_schema_field_names() {
        let disk = Disk::format(&small());
        let value = serde_json::to_value(disk.to_snapshot()).unwrap();
        assert_eq!(value["blocks"].as_array().unwrap().len(), 6);
        assert!(value["blocks"][0].is_null());
        assert!(value["files"].as_object().unwrap().is_empty());
        assert_eq!(value["strategy"], "bitmap");
        assert!(value["meta"]["created"].is_number());
    }

    #[test]
    fn missing_strategy_defaults_to_bitmap() {
        let snapshot = snapshot_json(
            r#"{"blocks":[null,null,null,null,null,null],"files":{},"meta":{"created":1.5}}"#,
        );
        let disk = Disk::from_snapshot(snapshot, &small()).unwrap();
        assert_eq!(disk.strategy, Strategy::Bitmap);
        assert_eq!(disk.meta.created, 1.5);
    }

    #[test]
    fn wrong_block_count_is_corrupt() {
        let snapshot = snapshot_json(r#"{"blocks":[null],"files":{},"strategy":"bitmap"}"#);
        assert!(matches!(
            Disk::from_snapshot(snapshot, &small()),
            Err(FileSystemError::CorruptState(_))
        ));
    }

    #[test]
    fn shared_block_is_corrupt() {
        let snapshot = snapshot_json(
            r#"{"blocks":["a",null,null,null,null,null],
                "files":{"x":[0],"y":[0]},"strategy":"first_fit"}"#,
        );
        assert!(matches!(
            Disk::from_snapshot(snapshot, &small()),
            Err(FileSystemError::CorruptState(msg)) if msg.contains("owned by both")
        ));
    }

    #[test]
    fn dangling_or_empty_reference_is_corrupt() {
        let out_of_range = snapshot_json(
            r#"{"blocks":[null,null,null,null,null,null],"files":{"x":[9]}}"#,
        );
        assert!(Disk::from_snapshot(out_of_range, &small()).is_err());

        let empty_slot = snapshot_json(
            r#"{"blocks":[null,null,null,null,null,null],"files":{"x":[1]}}"#,
        );
        assert!(Disk::from_snapshot(empty_slot, &small()).is_err());
    }

    #[test]
    fn unowned_filled_block_is_corrupt() {
        let snapshot = snapshot_json(
            r#"{"blocks":["a",null,"stray",null,null,null],"files":{"x":[0]}}"#,
        );
        assert!(matches!(
            Disk::from_snapshot(snapshot, &small()),
            Err(FileSystemError::CorruptState(msg)) if msg.contains("block 2")
        ));
    }

    #[test]
    fn oversized_fragment_is_corrupt() {
        let snapshot = snapshot_json(
            r#"{"blocks":["abcdef",null,null,null,null,null],"files":{"x":[0]}}"#,
        );
        assert!(matches!(
            Disk::from_snapshot(snapshot, &small()),
            Err(FileSystemError::CorruptState(_))
        ));
    }
}
