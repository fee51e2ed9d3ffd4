//! MiniVFS：固定大小虚拟磁盘上的块分配与碎片整理引擎
//!
//! 磁盘是一组定长块槽，文件内容按块切分后由三种策略之一分配
//! （`bitmap` / `first_fit` / `best_fit`），整盘状态以 JSON 快照持久化。

pub mod disk;
pub mod fs;
pub mod shell;
pub mod utils;

pub use disk::{Disk, FileDisk};
pub use fs::{
    allocator::Strategy,
    config::DiskConfig,
    error::{FileSystemError, Result},
    FileSystem,
};
