use thiserror::Error;

use crate::fs::allocator::Strategy;

/// 文件系统错误类型
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// 底层 I/O 错误
    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 快照编码失败
    #[error("Snapshot encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    /// 当前分配策略无法满足请求
    #[error("Not enough space: {needed} blocks requested under {strategy}")]
    NoSpace { needed: usize, strategy: Strategy },

    #[error("Invalid strategy: {0} (expected bitmap, first_fit or best_fit)")]
    InvalidStrategy(String),

    /// 命令行格式错误或参数个数不对，消息即提示文本
    #[error("{0}")]
    InvalidCommand(String),

    /// 持久化快照不可读或内容不一致
    #[error("Disk state corrupted: {0}")]
    CorruptState(String),

    #[error("Block index out of range: {0}")]
    InvalidBlock(usize),

    #[error("Fragment of {len} chars exceeds block size {block_size}")]
    FragmentTooLarge { len: usize, block_size: usize },
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
