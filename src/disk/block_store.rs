use crate::{
    disk::types::{Block, BlockId},
    fs::error::{FileSystemError, Result},
};

/// 固定长度的块槽序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStore {
    slots: Vec<Block>, // 每个槽为空或一个片段
    block_size: usize, // 片段长度上限（字符）
}

impl BlockStore {
    /// 创建全部为空的块区
    pub fn new(total_blocks: usize, block_size: usize) -> Self {
        Self {
            slots: vec![None; total_blocks],
            block_size,
        }
    }

    /// 从已有槽位重建，校验每个片段的长度
    pub fn from_slots(slots: Vec<Block>, block_size: usize) -> Result<Self> {
        for fragment in slots.iter().flatten() {
            check_fragment(fragment, block_size)?;
        }
        Ok(Self { slots, block_size })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn slots(&self) -> &[Block] {
        &self.slots
    }

    /// 空闲块编号，升序
    pub fn free_indices(&self) -> Vec<BlockId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    pub fn is_used(&self, index: BlockId) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    pub fn slot_content(&self, index: BlockId) -> Option<&str> {
        self.slots.get(index).and_then(|slot| slot.as_deref())
    }

    /// 写入或清空一个块槽
    pub fn set(&mut self, index: BlockId, block: Block) -> Result<()> {
        if let Some(fragment) = &block {
            check_fragment(fragment, self.block_size)?;
        }
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(FileSystemError::InvalidBlock(index))?;
        *slot = block;
        Ok(())
    }

    /// 释放一组块；越界编号忽略
    pub fn release(&mut self, indices: &[BlockId]) {
        for &index in indices {
            if let Some(slot) = self.slots.get_mut(index) {
                *slot = None;
            }
        }
    }

    /// 每块一位：true 为已使用
    pub fn used_map(&self) -> Vec<bool> {
        self.slots.iter().map(Option::is_some).collect()
    }
}

fn check_fragment(fragment: &str, block_size: usize) -> Result<()> {
    let len = fragment.chars().count();
    if len > block_size {
        return Err(FileSystemError::FragmentTooLarge { len, block_size });
    }
    Ok(())
}
