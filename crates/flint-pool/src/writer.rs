//! 切片写入器：链的追加端协作方。

use flint_core::{CoreError, Result};

use crate::pool::BytePool;

/// `SliceWriter` 是单条链的追加游标，与 [`BytePool`] 协作完成切片链的生长。
///
/// # 设计背景（Why）
/// - 索引构建期成千上万条链交错生长，若每条链都携带层级、边界等状态，
///   写入端内存开销会随条目数线性膨胀；本设计把边界信息编码进池字节本身
///   （切片末尾的非零标记），写入器只需保留一个 `u32` 游标。
/// - 写入器与读取器共享同一份 [`ChainLayout`](flint_core::ChainLayout)：
///   读取端将按同一层级推进表重放切片序列，任何不一致都会静默解码出错。
///
/// # 核心机制（How）
/// - [`begin`](Self::begin) 在层级 0 上分配首切片并记录链起点；
/// - [`write_byte`](Self::write_byte) 先探测游标处字节：零表示切片内部，
///   直接写入；非零表示命中末尾标记，先由池完成切片升级
///   （搬移 3 字节负载并安装转发地址）再续写；
/// - [`end_address`](Self::end_address) 即当前游标，作为链的终点地址交给
///   读取端；终点永远指向最后一个负载字节之后，绝不会落在转发地址字节上。
///
/// # 契约说明（What）
/// - **前置条件**：一个写入器只服务一条链；多条链可各持写入器交替追加，
///   但对池的可变借用由调用方串行化；
/// - **后置条件**：每次追加成功后 `(start_address, end_address)` 即构成
///   可供读取端绑定的合法链区间；
/// - **失败语义**：唯一的失败来源是池地址空间耗尽
///   （[`codes::POOL_ADDRESS_OVERFLOW`](flint_core::codes::POOL_ADDRESS_OVERFLOW)），
///   失败后链保持上次成功写入后的状态。
pub struct SliceWriter {
    start: u32,
    cursor: u32,
}

impl SliceWriter {
    /// 开启一条新链：分配层级 0 的首切片并绑定游标。
    pub fn begin(pool: &mut BytePool) -> Result<Self, CoreError> {
        let start = pool.new_slice(0)?;
        Ok(Self {
            start,
            cursor: start,
        })
    }

    /// 追加单个负载字节，必要时先完成切片升级。
    pub fn write_byte(&mut self, pool: &mut BytePool, byte: u8) -> Result<(), CoreError> {
        if pool.byte_at(self.cursor) != 0 {
            // 命中切片末尾标记：升级切片后游标落在搬移负载之后。
            self.cursor = pool.alloc_slice(self.cursor)?;
        }
        pool.set_byte(self.cursor, byte);
        self.cursor += 1;
        Ok(())
    }

    /// 顺序追加一段负载字节。
    ///
    /// 逐字节推进：切片边界可能落在区间内部任意位置，批量拷贝的收益
    /// 被边界探测抵消，且原始实现同样按字节写入。
    pub fn write_bytes(&mut self, pool: &mut BytePool, bytes: &[u8]) -> Result<(), CoreError> {
        for &byte in bytes {
            self.write_byte(pool, byte)?;
        }
        Ok(())
    }

    /// 链的全局起始地址（首切片的第一个负载字节）。
    pub fn start_address(&self) -> u32 {
        self.start
    }

    /// 链的全局终点地址：最后一个已写负载字节之后的位置。
    pub fn end_address(&self) -> u32 {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_core::{ChainLayout, SliceLevelTable};

    fn pool_with(block_size: usize, capacities: &[usize], next: &[usize]) -> BytePool {
        let table = SliceLevelTable::new(capacities, next).expect("构造层级表");
        BytePool::new(ChainLayout::new(block_size, table).expect("构造布局"))
    }

    #[test]
    fn empty_chain_has_equal_bounds() {
        let mut pool = pool_with(16, &[8], &[0]);
        let writer = SliceWriter::begin(&mut pool).expect("开启链");
        assert_eq!(writer.start_address(), writer.end_address());
    }

    #[test]
    fn short_chain_stays_in_first_slice() {
        let mut pool = pool_with(16, &[8], &[0]);
        let mut writer = SliceWriter::begin(&mut pool).expect("开启链");
        writer.write_bytes(&mut pool, &[65, 66, 67, 68, 69]).expect("追加负载");
        assert_eq!(writer.start_address(), 0);
        assert_eq!(writer.end_address(), 5);
        assert_eq!(pool.usage().block_count, 1, "未触发切片升级");
    }

    #[test]
    fn overflow_rolls_into_next_level_slice() {
        let mut pool = pool_with(32, &[5, 14], &[1, 1]);
        let mut writer = SliceWriter::begin(&mut pool).expect("开启链");
        // 容量 5 的首切片：4 字节负载后，第 5 字节命中标记并触发升级。
        writer.write_bytes(&mut pool, &[1, 2, 3, 4, 5]).expect("追加负载");
        // 升级后游标 = 新切片起点(5) + 搬移的 3 字节 + 新写入的 1 字节。
        assert_eq!(writer.end_address(), 5 + 3 + 1);
        // 旧切片最后 4 字节是指向新切片的转发地址。
        let forward = u32::from_be_bytes([
            pool.block(0)[1],
            pool.block(0)[2],
            pool.block(0)[3],
            pool.block(0)[4],
        ]);
        assert_eq!(forward, 5);
    }

    #[test]
    fn interleaved_chains_do_not_disturb_each_other() {
        let mut pool = pool_with(64, &[5, 14], &[1, 1]);
        let mut left = SliceWriter::begin(&mut pool).expect("链一");
        let mut right = SliceWriter::begin(&mut pool).expect("链二");
        for round in 0..8u8 {
            left.write_byte(&mut pool, round).expect("链一追加");
            right.write_byte(&mut pool, 100 + round).expect("链二追加");
        }
        // 两条链交错生长后各自保持可界定的区间。
        assert_ne!(left.start_address(), right.start_address());
        assert!(left.end_address() > left.start_address());
        assert!(right.end_address() > right.start_address());
    }
}
