use crate::disk::{BLOCK_SIZE, TOTAL_BLOCKS};

/// 默认快照文件
pub const DEFAULT_DISK_PATH: &str = "disk.json";

/// `map` 命令每行显示的块数
pub const MAP_ROW_WIDTH: usize = 64;

/// 磁盘几何参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskConfig {
    pub block_size: usize,   // 每块最多字符数
    pub total_blocks: usize, // 块总数
}

impl DiskConfig {
    pub fn new(block_size: usize, total_blocks: usize) -> Self {
        Self {
            block_size,
            total_blocks,
        }
    }

    /// 一段内容需要的块数：ceil(len / block_size)，空内容为 0
    pub fn blocks_needed(&self, len: usize) -> usize {
        len.div_ceil(self.block_size)
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self::new(BLOCK_SIZE, TOTAL_BLOCKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_needed_rounds_up() {
        let config = DiskConfig::default();
        assert_eq!(config.blocks_needed(0), 0);
        assert_eq!(config.blocks_needed(1), 1);
        assert_eq!(config.blocks_needed(BLOCK_SIZE), 1);
        assert_eq!(config.blocks_needed(BLOCK_SIZE + 1), 2);
    }
}
