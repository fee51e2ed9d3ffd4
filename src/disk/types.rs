/// 每个逻辑块（Block）最多容纳的字符数
/// 文件内容按块切分，最后一块可以不满。
pub const BLOCK_SIZE: usize = 128;

/// 虚拟磁盘中包含的块总数，创建后不再改变
pub const TOTAL_BLOCKS: usize = 128;

/// 一个块槽：`None` 表示空闲，`Some` 为文件内容片段
pub type Block = Option<String>;

/// 块编号（从 0 开始）
pub type BlockId = usize;
