use std::collections::HashMap;

use crate::{
    disk::BlockId,
    fs::error::{FileSystemError, Result},
};

/// 路径到块编号序列的映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTable {
    entries: HashMap<String, Vec<BlockId>>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Result<&[BlockId]> {
        self.entries
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// 新建或替换一个文件的块序列
    pub fn set(&mut self, path: &str, blocks: Vec<BlockId>) {
        self.entries.insert(path.to_string(), blocks);
    }

    /// 删除表项，返回原来占用的块
    pub fn remove(&mut self, path: &str) -> Option<Vec<BlockId>> {
        self.entries.remove(path)
    }

    /// 全部表项，按路径排序
    pub fn list(&self) -> Vec<(&str, &[BlockId])> {
        let mut rows: Vec<_> = self
            .entries
            .iter()
            .map(|(path, blocks)| (path.as_str(), blocks.as_slice()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<BlockId>)> for FileTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<BlockId>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut table = FileTable::new();
        table.set("/b", vec![3, 4]);
        table.set("/a", vec![]);

        assert_eq!(table.get("/b").unwrap(), &[3, 4]);
        assert!(table.get("/a").unwrap().is_empty());
        assert_eq!(table.len(), 2);

        table.set("/b", vec![7]);
        assert_eq!(table.get("/b").unwrap(), &[7]);

        assert_eq!(table.remove("/b"), Some(vec![7]));
        assert!(matches!(table.get("/b"), Err(FileSystemError::NotFound(p)) if p == "/b"));
        assert_eq!(table.remove("/b"), None);
    }

    #[test]
    fn list_is_sorted_by_path() {
        let table: FileTable = [
            ("zeta".to_string(), vec![0]),
            ("alpha".to_string(), vec![1]),
            ("mid".to_string(), vec![2]),
        ]
        .into_iter()
        .collect();

        let paths: Vec<_> = table.list().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["alpha", "mid", "zeta"]);
    }
}
