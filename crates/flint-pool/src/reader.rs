//! 切片读取器：链式字节切片池的顺序解码核心。

use flint_core::{ChainSink, CoreError, FORWARD_ADDR_LEN, Result};

use crate::pool::BytePool;

/// `SliceReader` 对单条链做一次性的前向遍历，逐字节复原写入端追加的负载。
///
/// # 设计背景（Why）
/// - 链在物理上是散落于共享块中的切片链表，非终端切片以尾部 4 字节大端
///   转发地址指向下一切片；读取端必须确定性地重放写入端的层级推进序列，
///   既还原全部负载字节，又跳过所有转发字节。
/// - 游标以 `(块引用, 块内偏移, 切片边界, 层级, 块基准地址)` 的显式索引
///   形态持有位置，而非裸指针：块永不搬移，索引在池存活期内恒有效。
///
/// # 核心机制（How）
/// - 绑定时从层级 0 出发；游标推进到切片边界 `limit` 时执行一次切片跳转
///   （`next_slice`）：解码转发地址、按推进表升级层级、
///   整体重置游标五元组；
/// - 终端判定与写入端的分配时序严格对偶：`切片起点 + 容量 >= 终点地址`
///   即为终端切片，边界直接取终点，不再预留转发字节。
///
/// # 契约说明（What）
/// - **生命周期**：一次绑定、单向消费、用毕即弃；读取器不拥有块，
///   仅持只读借用；
/// - **前置条件**：`(start, end)` 必须来自同一池上写入器的
///   `start_address()` / `end_address()`，且两端使用同一份布局配置；
///   本组件不校验不可信输入，链边界的合法性由上游保证；
/// - **失败语义**：越过终点读取、在终点处取字节等均为调用方编程错误——
///   debug 构建以断言终止，release 构建行为未定义（不会引入未定义内存
///   行为，但可能 panic 或解码出无意义字节）。唯一可恢复的失败是排空
///   时下游接收器返回的错误，原样透传。
///
/// # 设计权衡（Trade-offs）
/// - 热路径上不做任何 `Result` 包装与输入校验，对齐原始实现
///   “debug 断言 + release 不设防”的性能取向。
pub struct SliceReader<'pool> {
    pool: &'pool BytePool,
    /// 当前切片所在块的只读视图。
    block: &'pool [u8],
    /// 当前块的基准全局地址。
    buffer_offset: u32,
    /// 块内读取位置。
    upto: usize,
    /// 当前切片的块内边界：非终端切片指向转发地址首字节，终端切片指向终点。
    limit: usize,
    /// 当前层级，沿共享推进表单调上行。
    level: usize,
    /// 链的全局终点地址。
    end: u32,
}

impl<'pool> SliceReader<'pool> {
    /// 把读取游标绑定到一条链上；不读取任何字节。
    ///
    /// # 契约定义（What）
    /// - **前置条件**：`start <= end`（debug 断言）；链的首切片必须写于
    ///   层级 0——本实现沿用原始设计的假设，不校验底层数据的实际层级，
    ///   从链中途“续读”属于未定义行为；
    /// - **后置条件**：游标位于 `start`，首切片边界已按“整链是否容纳于
    ///   层级 0 容量”判定为终端或非终端。
    pub fn new(pool: &'pool BytePool, start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "链区间必须满足 start <= end");
        let layout = pool.layout();
        let block_index = layout.block_index(start);
        let block = pool.block(block_index);
        let buffer_offset = layout.block_start(block_index);
        let upto = layout.offset_in_block(start);
        let first_capacity = layout.levels().first_capacity();

        let limit = if u64::from(start) + first_capacity as u64 >= u64::from(end) {
            // 整链容纳于首切片：终端切片，不预留转发字节。
            layout.offset_in_block(end)
        } else {
            upto + first_capacity - FORWARD_ADDR_LEN
        };

        Self {
            pool,
            block,
            buffer_offset,
            upto,
            limit,
            level: 0,
            end,
        }
    }

    /// 游标是否已达链的终点。纯查询，无副作用。
    pub fn at_end(&self) -> bool {
        self.buffer_offset + self.upto as u32 == self.end
    }

    /// 读出下一个负载字节并前移游标。
    ///
    /// # 契约定义（What）
    /// - **前置条件**：`!at_end()`（debug 断言）；
    /// - **后置条件**：恰好推进一个负载位置，必要时先完成一次切片跳转。
    pub fn read_byte(&mut self) -> u8 {
        debug_assert!(!self.at_end(), "在链终点之后继续取字节");
        if self.upto == self.limit {
            self.next_slice();
        }
        let byte = self.block[self.upto];
        self.upto += 1;
        byte
    }

    /// 把接下来的 `dst.len()` 个负载字节拷入目标区间。
    ///
    /// # 执行逻辑（How）
    /// - 循环消费切片：当前切片余量不足时整段拷出并跳转下一切片；
    ///   足够时一次拷完即停。游标恰好停在 `limit` 上时不急切跳转，
    ///   跳转推迟到下一次访问（惰性语义）。
    ///
    /// # 契约定义（What）
    /// - **前置条件**：请求范围不得越过链终点；违约属于调用方编程错误，
    ///   将在 debug 构建的跳转断言处终止。
    pub fn read(&mut self, dst: &mut [u8]) {
        let mut offset = 0;
        let mut len = dst.len();
        while len > 0 {
            let available = self.limit - self.upto;
            if available < len {
                dst[offset..offset + available]
                    .copy_from_slice(&self.block[self.upto..self.limit]);
                offset += available;
                len -= available;
                self.next_slice();
            } else {
                dst[offset..offset + len]
                    .copy_from_slice(&self.block[self.upto..self.upto + len]);
                self.upto += len;
                break;
            }
        }
    }

    /// 把游标至链终点之间的全部负载字节按序排入接收器，返回排出的字节总数。
    ///
    /// # 契约定义（What）
    /// - **失败语义**：接收器返回的错误立即中止排空并原样向上传播，
    ///   不包装、不吞并；此前已排出的字节不会回滚；
    /// - **后置条件**：成功时游标停在链终点，`at_end()` 为真。
    pub fn drain_into(&mut self, sink: &mut dyn ChainSink) -> Result<usize, CoreError> {
        let mut total = 0;
        loop {
            let chunk = &self.block[self.upto..self.limit];
            sink.write_chunk(chunk)?;
            total += chunk.len();
            if self.buffer_offset + self.limit as u32 == self.end {
                // 终端切片已排空。
                self.upto = self.limit;
                return Ok(total);
            }
            self.next_slice();
        }
    }

    /// 切片跳转：解码转发地址并把游标整体迁移到下一切片。
    ///
    /// # 执行逻辑（How）
    /// 1. 当前切片 `[limit, limit + 4)` 处的大端 `u32` 即下一切片的全局起点；
    /// 2. 层级沿共享推进表上行，取得新容量；
    /// 3. 游标五元组（块、基准地址、位置、边界、层级）作为整体一次性重置，
    ///    不存在可被观察到的中间状态；
    /// 4. `新起点 + 新容量 >= 终点` 判定终端切片：边界取终点相对块基准的
    ///    偏移；否则预留尾部 4 字节转发地址。
    ///
    /// 本方法从不读写负载字节，只重定位游标。
    fn next_slice(&mut self) {
        debug_assert!(
            self.buffer_offset + self.limit as u32 != self.end,
            "在终端切片上触发跳转意味着越界读取"
        );
        let forward = &self.block[self.limit..self.limit + FORWARD_ADDR_LEN];
        let next_start = u32::from_be_bytes([forward[0], forward[1], forward[2], forward[3]]);

        let layout = self.pool.layout();
        self.level = layout.levels().next(self.level);
        let capacity = layout.levels().capacity(self.level);

        let block_index = layout.block_index(next_start);
        self.block = self.pool.block(block_index);
        self.buffer_offset = layout.block_start(block_index);
        self.upto = layout.offset_in_block(next_start);
        self.limit = if u64::from(next_start) + capacity as u64 >= u64::from(self.end) {
            (self.end - self.buffer_offset) as usize
        } else {
            self.upto + capacity - FORWARD_ADDR_LEN
        };
    }
}
