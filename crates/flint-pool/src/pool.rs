//! 块池：链式切片的物理存储层。

use alloc::{boxed::Box, vec, vec::Vec};

use flint_core::{ChainLayout, CoreError, Result, codes};

/// 切片末尾标记的高位基底：标记字节编码为 `0x10 | level`。
///
/// 新分配切片的内部恒为零，因此写入游标遇到非零字节即可断定“切片已满”，
/// 并从低 4 位还原当前层级。这是写入端无需逐链记录层级的关键。
pub(crate) const END_MARKER_BASE: u8 = 0x10;

/// `BytePool` 是链式字节切片池的块存储：一组定长、零填充、永不搬移的内存块。
///
/// # 模块角色（Why）
/// - 倒排索引构建期需要为海量条目各自累积变长字节序列（如词项倒排表），
///   逐序列分配会产生碎片与分配器压力；块池把所有序列交错写入少量大块，
///   以切片链的形式复用存储。
/// - 块一经分配便不再缩放或搬移，已发放的全局地址与读取游标因此永久有效，
///   这是读取端能持有 `(块下标, 偏移)` 而非裸指针的前提。
///
/// # 核心机制（How）
/// - 全局地址 = `块下标 * block_size + 块内偏移`，分解规则由注入的
///   [`ChainLayout`] 统一提供，写读两端共享；
/// - `new_slice` 分配某层级的新切片并在末字节写入
///   `0x10 | level` 标记；`alloc_slice` 在切片写满时
///   升级到下一层级：搬移旧切片末端 3 字节负载、以大端 `u32` 在旧切片
///   最后 4 字节安装指向新切片起点的转发地址；
/// - 地址空间受转发地址宽度（32 位）约束，扩容越界时返回
///   [`codes::POOL_ADDRESS_OVERFLOW`]。
///
/// # 契约说明（What）
/// - **前置条件**：池由单一所有者独占写入（`&mut self`）；并发读取多条互不
///   重叠的链是安全的，但不得与写入并发；
/// - **后置条件**：`block` 返回的切片在池生命周期内保持有效；已写入链的
///   字节不再变化（除切片升级时对尾部 4 字节的一次性转发覆写）。
///
/// # 设计权衡（Trade-offs）
/// - 不提供块的释放或复用：全局地址在池存活期间永不回收，换取读取端
///   无需任何失效检查；整池丢弃即整体回收。
pub struct BytePool {
    layout: ChainLayout,
    blocks: Vec<Box<[u8]>>,
    /// 当前块内的下一个空闲偏移；池为空时等于块尺寸，促使首次分配建块。
    byte_upto: usize,
}

impl BytePool {
    /// 以注入的布局创建空池；首个块在首次切片分配时才真正建出。
    pub fn new(layout: ChainLayout) -> Self {
        let byte_upto = layout.block_size();
        Self {
            layout,
            blocks: Vec::new(),
            byte_upto,
        }
    }

    /// 写读两端共享的布局配置。
    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    /// 按下标取块的只读视图；越界属于调用方编程错误。
    pub fn block(&self, index: usize) -> &[u8] {
        &self.blocks[index]
    }

    /// 当前用量快照，供容量规划与测试观测。
    pub fn usage(&self) -> PoolUsage {
        let block_size = self.layout.block_size();
        let allocated_bytes = self.blocks.len() * block_size;
        let used_bytes = if self.blocks.is_empty() {
            0
        } else {
            (self.blocks.len() - 1) * block_size + self.byte_upto
        };
        PoolUsage {
            block_count: self.blocks.len(),
            allocated_bytes,
            used_bytes,
        }
    }

    /// 追加一个零填充的新块。
    ///
    /// # 契约说明（What）
    /// - **失败语义**：若新块的任一地址超出 32 位全局地址空间（转发地址的
    ///   编码宽度），返回 [`codes::POOL_ADDRESS_OVERFLOW`]，池保持原状。
    fn push_block(&mut self) -> Result<(), CoreError> {
        let block_size = self.layout.block_size() as u64;
        let next_end = (self.blocks.len() as u64 + 1) * block_size;
        if next_end > u64::from(u32::MAX) + 1 {
            return Err(CoreError::new(
                codes::POOL_ADDRESS_OVERFLOW,
                "再分配一个块将超出 32 位全局地址空间",
            ));
        }
        self.blocks
            .push(vec![0u8; self.layout.block_size()].into_boxed_slice());
        self.byte_upto = 0;
        Ok(())
    }

    /// 在指定层级上分配一个新切片，返回其全局起始地址。
    ///
    /// # 执行逻辑（How）
    /// 1. 当前块剩余空间不足整个切片时换新块（切片永不跨块，块尾零字节弃置）；
    /// 2. 预订 `capacity` 字节，并在切片末字节写入 `0x10 | level` 标记；
    ///    切片内部保持零填充，供写入游标识别边界。
    pub(crate) fn new_slice(&mut self, level: usize) -> Result<u32, CoreError> {
        let capacity = self.layout.levels().capacity(level);
        if self.byte_upto + capacity > self.layout.block_size() {
            self.push_block()?;
        }
        let start_local = self.byte_upto;
        self.byte_upto += capacity;
        let block_index = self.blocks.len() - 1;
        self.blocks[block_index][start_local + capacity - 1] = END_MARKER_BASE | level as u8;
        Ok(self.layout.block_start(block_index) + start_local as u32)
    }

    /// 切片升级：在写入游标命中末尾标记时扩展链，返回新的写入位置。
    ///
    /// # 执行逻辑（How）
    /// 1. 从标记字节低 4 位还原当前层级，并按推进表取得新层级与新容量；
    /// 2. 分配新切片（末字节带上新层级标记）；
    /// 3. 把旧切片末端 3 字节负载搬入新切片开头——这三个字节即将被转发地址
    ///    覆写，而读取端期望负载在新切片起点处连续；
    /// 4. 以大端 `u32` 把新切片起始地址写入旧切片最后 4 字节；
    /// 5. 返回 `新起点 + 3`，写入端从搬移负载之后继续追加。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`marker_address` 必须指向某切片的末尾标记字节，
    ///   即该链写入游标当前命中的位置；其余情形属于调用方编程错误。
    pub(crate) fn alloc_slice(&mut self, marker_address: u32) -> Result<u32, CoreError> {
        let block_index = self.layout.block_index(marker_address);
        let marker_offset = self.layout.offset_in_block(marker_address);
        let marker = self.blocks[block_index][marker_offset];
        debug_assert_eq!(
            marker & 0xf0,
            END_MARKER_BASE,
            "写入游标应命中切片末尾标记"
        );

        let level = (marker & 0x0f) as usize;
        let next_level = self.layout.levels().next(level);
        let next_start = self.new_slice(next_level)?;
        let next_block = self.layout.block_index(next_start);
        let next_offset = self.layout.offset_in_block(next_start);

        // 标记位于切片末字节，而切片容量至少 5，故其前方必有 3 字节负载可搬。
        let relocated = [
            self.blocks[block_index][marker_offset - 3],
            self.blocks[block_index][marker_offset - 2],
            self.blocks[block_index][marker_offset - 1],
        ];
        self.blocks[next_block][next_offset..next_offset + 3].copy_from_slice(&relocated);

        let forward = next_start.to_be_bytes();
        self.blocks[block_index][marker_offset - 3..=marker_offset].copy_from_slice(&forward);

        Ok(next_start + 3)
    }

    /// 读取单个全局地址上的字节，供写入游标探测切片边界。
    pub(crate) fn byte_at(&self, address: u32) -> u8 {
        self.blocks[self.layout.block_index(address)][self.layout.offset_in_block(address)]
    }

    /// 向指定全局地址写入一个负载字节。
    pub(crate) fn set_byte(&mut self, address: u32, value: u8) {
        let block_index = self.layout.block_index(address);
        let offset = self.layout.offset_in_block(address);
        self.blocks[block_index][offset] = value;
    }
}

/// 池用量快照，对齐本工作区缓冲池“统计即观测”的做法：不埋点、不加锁，
/// 由独占所有者在需要时拍取。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    /// 已分配的块数。
    pub block_count: usize,
    /// 已向分配器申请的总字节数。
    pub allocated_bytes: usize,
    /// 已被切片预订的字节数（含换块时弃置的块尾零字节）。
    pub used_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_core::SliceLevelTable;

    fn small_layout() -> ChainLayout {
        let table = SliceLevelTable::new(&[8], &[0]).expect("构造层级表");
        ChainLayout::new(16, table).expect("构造布局")
    }

    #[test]
    fn empty_pool_reports_zero_usage() {
        let pool = BytePool::new(small_layout());
        assert_eq!(
            pool.usage(),
            PoolUsage {
                block_count: 0,
                allocated_bytes: 0,
                used_bytes: 0
            }
        );
    }

    #[test]
    fn new_slice_marks_slice_end() {
        let mut pool = BytePool::new(small_layout());
        let start = pool.new_slice(0).expect("分配首切片");
        assert_eq!(start, 0);
        assert_eq!(pool.byte_at(7), END_MARKER_BASE, "层级 0 的末尾标记");
        assert_eq!(pool.usage().block_count, 1);
        assert_eq!(pool.usage().used_bytes, 8);
    }

    #[test]
    fn slices_never_straddle_blocks() {
        let mut pool = BytePool::new(small_layout());
        let first = pool.new_slice(0).expect("首切片");
        let second = pool.new_slice(0).expect("次切片");
        let third = pool.new_slice(0).expect("第三切片应落在新块");
        assert_eq!((first, second, third), (0, 8, 16));
        assert_eq!(pool.usage().block_count, 2);
    }

    #[test]
    fn alloc_slice_installs_big_endian_forward_address() {
        let mut pool = BytePool::new(small_layout());
        let start = pool.new_slice(0).expect("首切片");
        for offset in 0..7 {
            pool.set_byte(start + offset, 0xAA);
        }
        let next_cursor = pool.alloc_slice(start + 7).expect("切片升级");
        let next_start = next_cursor - 3;
        assert_eq!(next_start, 8);
        // 旧切片最后 4 字节应为指向新切片的大端转发地址。
        let forward = [
            pool.byte_at(4),
            pool.byte_at(5),
            pool.byte_at(6),
            pool.byte_at(7),
        ];
        assert_eq!(u32::from_be_bytes(forward), next_start);
        // 被覆写的 3 字节负载应已搬至新切片起点。
        assert_eq!(
            [
                pool.byte_at(next_start),
                pool.byte_at(next_start + 1),
                pool.byte_at(next_start + 2)
            ],
            [0xAA, 0xAA, 0xAA]
        );
    }
}
