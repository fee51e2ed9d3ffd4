pub mod allocator;
pub mod config;
pub mod error;
pub mod file_table;

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    disk::{BlockId, BlockStore, Disk},
    fs::{
        allocator::{allocate, Strategy},
        config::DiskConfig,
        error::{FileSystemError, Result},
        file_table::FileTable,
    },
    utils::format_timestamp,
};

/// 文件块布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Contiguous,
    Fragmented,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Contiguous => f.write_str("contiguous"),
            Layout::Fragmented => f.write_str("fragmented"),
        }
    }
}

/// `ls` 的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub blocks: usize,
    pub size: usize, // 各片段长度之和
    pub layout: Layout,
}

/// 整理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefragReport {
    pub files: usize,
    pub blocks_used: usize,
    pub relocated: usize, // 编号发生变化的块数
}

/// 磁盘概况
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskInfo {
    pub strategy: Strategy,
    pub files: usize,
    pub free_blocks: usize,
    pub total_blocks: usize,
    pub block_size: usize,
    pub created: f64,
    pub created_at: String, // 可读的创建时间
}

/// 块编号是否构成升序连续区间；0 或 1 块视为连续
pub fn is_contiguous(blocks: &[BlockId]) -> bool {
    blocks.windows(2).all(|w| w[0] + 1 == w[1])
}

/// 存储引擎：唯一持有并修改 Disk
#[derive(Debug, Clone)]
pub struct FileSystem {
    disk: Disk,
}

impl FileSystem {
    pub fn new(disk: Disk) -> Self {
        Self { disk }
    }

    /// 空盘
    pub fn format(config: &DiskConfig) -> Self {
        Self::new(Disk::format(config))
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    /// 当前磁盘的几何参数
    pub fn config(&self) -> DiskConfig {
        DiskConfig::new(self.block_size(), self.disk.blocks.len())
    }

    pub fn strategy(&self) -> Strategy {
        self.disk.strategy
    }

    pub fn block_size(&self) -> usize {
        self.disk.blocks.block_size()
    }

    /// 整体（重）写一个文件，返回写入的字符数
    ///
    /// 旧块先释放再分配。分配失败时返回 `NoSpace`，旧内容已经丢失。
    pub fn write(&mut self, path: &str, content: &str) -> Result<usize> {
        let block_size = self.block_size();
        let chars: Vec<char> = content.chars().collect();
        let needed = self.config().blocks_needed(chars.len());

        let had_old = if let Some(old) = self.disk.files.remove(path) {
            self.disk.blocks.release(&old);
            true
        } else {
            false
        };

        let blocks = match allocate(&self.disk.blocks, needed, self.disk.strategy) {
            Ok(blocks) => blocks,
            Err(e) => {
                if had_old {
                    warn!(path, needed, "reallocation failed, previous content dropped");
                }
                return Err(e);
            }
        };

        for (&index, chunk) in blocks.iter().zip(chars.chunks(block_size)) {
            self.disk
                .blocks
                .set(index, Some(chunk.iter().collect()))?;
        }
        self.disk.files.set(path, blocks);

        info!(path, chars = chars.len(), blocks = needed, strategy = %self.disk.strategy, "file written");
        Ok(chars.len())
    }

    /// 追加：读出旧内容拼接后整体重写，返回文件新长度
    pub fn append(&mut self, path: &str, content: &str) -> Result<usize> {
        let mut combined = if self.disk.files.contains(path) {
            self.read(path)?
        } else {
            String::new()
        };
        combined.push_str(content);
        self.write(path, &combined)
    }

    pub fn read(&self, path: &str) -> Result<String> {
        let blocks = self.disk.files.get(path)?;
        Ok(blocks
            .iter()
            .filter_map(|&b| self.disk.blocks.slot_content(b))
            .collect())
    }

    pub fn delete(&mut self, path: &str) -> Result<()> {
        let blocks = self
            .disk
            .files
            .remove(path)
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;
        self.disk.blocks.release(&blocks);
        info!(path, freed = blocks.len(), "file deleted");
        Ok(())
    }

    /// 每个文件的块数、大小和布局，按路径排序
    pub fn list(&self) -> Vec<FileReport> {
        self.disk
            .files
            .list()
            .into_iter()
            .map(|(path, blocks)| FileReport {
                path: path.to_string(),
                blocks: blocks.len(),
                size: blocks
                    .iter()
                    .filter_map(|&b| self.disk.blocks.slot_content(b))
                    .map(|s| s.chars().count())
                    .sum(),
                layout: if is_contiguous(blocks) {
                    Layout::Contiguous
                } else {
                    Layout::Fragmented
                },
            })
            .collect()
    }

    /// 按路径字典序从 0 号块开始紧凑重排，策略不变
    pub fn defragment(&mut self) -> Result<DefragReport> {
        let config = self.config();
        let block_size = config.block_size;
        let mut blocks = BlockStore::new(config.total_blocks, block_size);
        let mut files = FileTable::new();
        let mut report = DefragReport::default();
        let mut next = 0;

        for (path, old) in self.disk.files.list() {
            let chars: Vec<char> = self.read(path)?.chars().collect();
            let assigned: Vec<BlockId> = (next..next + config.blocks_needed(chars.len())).collect();

            for (&index, chunk) in assigned.iter().zip(chars.chunks(block_size)) {
                blocks.set(index, Some(chunk.iter().collect()))?;
            }
            report.relocated += old
                .iter()
                .zip(&assigned)
                .filter(|(from, to)| from != to)
                .count();
            next += assigned.len();
            files.set(path, assigned);
            report.files += 1;
        }

        report.blocks_used = next;
        self.disk.blocks = blocks;
        self.disk.files = files;

        info!(files = report.files, relocated = report.relocated, "defragmentation complete");
        Ok(report)
    }

    /// 切换分配策略，只影响之后的分配
    pub fn set_strategy(&mut self, name: &str) -> Result<Strategy> {
        let strategy: Strategy = name.parse()?;
        self.disk.strategy = strategy;
        info!(%strategy, "allocation strategy changed");
        Ok(strategy)
    }

    /// 每块一位，true 为已使用
    pub fn block_map(&self) -> Vec<bool> {
        self.disk.blocks.used_map()
    }

    pub fn info(&self) -> DiskInfo {
        DiskInfo {
            strategy: self.disk.strategy,
            files: self.disk.files.len(),
            free_blocks: self.disk.blocks.free_count(),
            total_blocks: self.disk.blocks.len(),
            block_size: self.block_size(),
            created: self.disk.meta.created,
            created_at: format_timestamp(self.disk.meta.created),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_fs(block_size: usize, total_blocks: usize) -> FileSystem {
        FileSystem::format(&DiskConfig::new(block_size, total_blocks))
    }

    #[test]
    fn write_read_round_trip_all_strategies() {
        for strategy in Strategy::ALL {
            let mut fs = small_fs(4, 16);
            fs.set_strategy(strategy.as_str()).unwrap();
            assert_eq!(fs.write("a", "hello world").unwrap(), 11);
            assert_eq!(fs.read("a").unwrap(), "hello world");
        }
    }

    #[test]
    fn block_count_boundaries() {
        let mut fs = small_fs(4, 8);
        fs.write("exact", "abcd").unwrap();
        fs.write("over", "abcde").unwrap();
        fs.write("empty", "").unwrap();

        assert_eq!(fs.disk().files.get("exact").unwrap().len(), 1);
        assert_eq!(fs.disk().files.get("over").unwrap().len(), 2);
        assert!(fs.disk().files.get("empty").unwrap().is_empty());
        assert_eq!(fs.read("empty").unwrap(), "");
        assert_eq!(fs.config(), DiskConfig::new(4, 8));
    }

    #[test]
    fn rewrite_reuses_own_blocks() {
        let mut fs = small_fs(4, 2);
        fs.write("a", "12345678").unwrap();
        assert_eq!(fs.info().free_blocks, 0);
        fs.write("a", "abcdefgh").unwrap();
        assert_eq!(fs.read("a").unwrap(), "abcdefgh");
    }

    #[test]
    fn failed_rewrite_drops_old_content() {
        let mut fs = small_fs(4, 2);
        fs.write("a", "1234").unwrap();
        let err = fs.write("a", "123456789").unwrap_err();
        assert!(matches!(err, FileSystemError::NoSpace { needed: 3, .. }));
        assert!(matches!(fs.read("a"), Err(FileSystemError::NotFound(_))));
        assert_eq!(fs.info().free_blocks, 2);
    }

    #[test]
    fn append_concatenates() {
        let mut fs = small_fs(4, 8);
        fs.append("log", "abc").unwrap();
        assert_eq!(fs.append("log", "defgh").unwrap(), 8);
        assert_eq!(fs.read("log").unwrap(), "abcdefgh");
    }

    #[test]
    fn delete_frees_blocks() {
        let mut fs = small_fs(4, 8);
        fs.write("a", "123456789").unwrap();
        let owned = fs.disk().files.get("a").unwrap().to_vec();

        fs.delete("a").unwrap();
        assert!(matches!(fs.read("a"), Err(FileSystemError::NotFound(_))));
        let free = fs.disk().blocks.free_indices();
        assert!(owned.iter().all(|b| free.contains(b)));
        assert!(matches!(fs.delete("a"), Err(FileSystemError::NotFound(_))));
    }

    #[test]
    fn list_reports_layout() {
        let mut fs = small_fs(2, 8);
        fs.write("a", "xx").unwrap(); // [0]
        fs.write("b", "yy").unwrap(); // [1]
        fs.write("c", "zz").unwrap(); // [2]
        fs.delete("b").unwrap();
        fs.write("d", "wwww").unwrap(); // bitmap: [1, 3]

        let rows = fs.list();
        let by_path = |p: &str| rows.iter().find(|r| r.path == p).unwrap().clone();
        assert_eq!(by_path("a").layout, Layout::Contiguous);
        assert_eq!(
            by_path("d"),
            FileReport {
                path: "d".into(),
                blocks: 2,
                size: 4,
                layout: Layout::Fragmented,
            }
        );
    }

    #[test]
    fn defragment_packs_in_path_order() {
        let mut fs = small_fs(2, 8);
        fs.write("b", "bb").unwrap();
        fs.write("gap", "--").unwrap();
        fs.write("a", "aaa").unwrap();
        fs.delete("gap").unwrap();
        fs.set_strategy("best_fit").unwrap();

        let report = fs.defragment().unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.blocks_used, 3);

        assert_eq!(fs.disk().files.get("a").unwrap(), &[0, 1]);
        assert_eq!(fs.disk().files.get("b").unwrap(), &[2]);
        assert_eq!(fs.read("a").unwrap(), "aaa");
        assert_eq!(fs.read("b").unwrap(), "bb");
        assert_eq!(fs.strategy(), Strategy::BestFit);
        assert_eq!(
            fs.block_map(),
            vec![true, true, true, false, false, false, false, false]
        );
    }

    #[test]
    fn invalid_strategy_keeps_current() {
        let mut fs = small_fs(4, 4);
        fs.set_strategy("first_fit").unwrap();
        assert!(matches!(
            fs.set_strategy("bogus"),
            Err(FileSystemError::InvalidStrategy(_))
        ));
        assert_eq!(fs.strategy(), Strategy::FirstFit);
    }

    #[test]
    fn multibyte_content_splits_on_chars() {
        let mut fs = small_fs(2, 8);
        fs.write("zh", "虚拟磁盘系统").unwrap();
        assert_eq!(fs.disk().files.get("zh").unwrap().len(), 3);
        assert_eq!(fs.read("zh").unwrap(), "虚拟磁盘系统");
    }

    #[test]
    fn contiguity() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[7]));
        assert!(is_contiguous(&[3, 4, 5]));
        assert!(!is_contiguous(&[3, 5]));
        assert!(!is_contiguous(&[4, 3]));
    }
}
