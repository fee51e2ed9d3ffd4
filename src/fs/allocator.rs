use std::{fmt, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    disk::{BlockId, BlockStore},
    fs::error::{FileSystemError, Result},
};

/// 块分配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// 取最前面的 n 个空闲块，不要求连续
    #[default]
    Bitmap,
    /// 第一段长度达到 n 的连续空闲区
    FirstFit,
    /// 长度不小于 n 的最短连续空闲区
    BestFit,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Bitmap, Strategy::FirstFit, Strategy::BestFit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Bitmap => "bitmap",
            Strategy::FirstFit => "first_fit",
            Strategy::BestFit => "best_fit",
        }
    }

    fn finder(self) -> fn(&BlockStore, usize) -> Option<Vec<BlockId>> {
        match self {
            Strategy::Bitmap => bitmap,
            Strategy::FirstFit => first_fit,
            Strategy::BestFit => best_fit,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = FileSystemError;

    fn from_str(name: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|s| s.as_str() == name)
            .ok_or_else(|| FileSystemError::InvalidStrategy(name.to_string()))
    }
}

/// 按策略为 n 个块选出编号，不修改块区
pub fn allocate(store: &BlockStore, n: usize, strategy: Strategy) -> Result<Vec<BlockId>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let blocks = strategy.finder()(store, n).ok_or(FileSystemError::NoSpace {
        needed: n,
        strategy,
    })?;
    debug!(%strategy, needed = n, ?blocks, "allocated blocks");
    Ok(blocks)
}

/// 所有极大连续空闲区，按编号升序
pub fn free_runs(store: &BlockStore) -> Vec<Range<BlockId>> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..store.len() {
        match (store.is_used(i), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..store.len());
    }
    runs
}

fn bitmap(store: &BlockStore, n: usize) -> Option<Vec<BlockId>> {
    let free = store.free_indices();
    if free.len() < n {
        return None;
    }
    Some(free[..n].to_vec())
}

fn first_fit(store: &BlockStore, n: usize) -> Option<Vec<BlockId>> {
    let mut run = 0;
    for i in 0..store.len() {
        if store.is_used(i) {
            run = 0;
        } else {
            run += 1;
        }
        if run == n {
            return Some((i + 1 - n..=i).collect());
        }
    }
    None
}

fn best_fit(store: &BlockStore, n: usize) -> Option<Vec<BlockId>> {
    // min_by_key 在长度相同时保留先出现的区间
    free_runs(store)
        .into_iter()
        .filter(|run| run.len() >= n)
        .min_by_key(|run| run.len())
        .map(|run| run.take(n).collect())
}
