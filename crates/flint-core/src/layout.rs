//! 链式切片池的注入式配置：层级表与块寻址方案。
//!
//! # 模块定位（Why）
//! - 写入端与读取端必须对“切片逐级增长”的进度表达成逐字节一致，否则解码会静默损坏；
//!   因此把 [`SliceLevelTable`] 与块尺寸组合成单一不可变对象 [`ChainLayout`]，
//!   由池持有并同时供两端读取，使耦合显式化、可单独测试。
//! - 全局地址到 `(块下标, 块内偏移)` 的分解集中在此处，避免移位/掩码常量散落各处。
//!
//! # 设计总览（How）
//! - [`SliceLevelTable`] 持有两条平行数组：各层级切片容量与“下一层级”推进表；
//!   构造时完成全部校验，此后只读。
//! - [`ChainLayout`] 校验块尺寸为 2 的幂且不小于最大切片容量（切片永不跨块），
//!   并预计算移位与掩码。

use crate::error::{CoreError, Result, codes};
use alloc::{format, vec::Vec};

/// 非终端切片尾部预留的转发地址字节数（大端 `u32`）。
pub const FORWARD_ADDR_LEN: usize = 4;

/// 层级数上限：切片末尾标记以 `0x10 | level` 编码，层级必须容纳于低 4 位。
const MAX_LEVELS: usize = 16;

/// 切片最小容量：转发地址 4 字节之外至少还要容纳 1 字节负载。
const MIN_CAPACITY: usize = FORWARD_ADDR_LEN + 1;

/// `SliceLevelTable` 描述一条链的切片容量如何随长度逐级增长。
///
/// # 设计背景（Why）
/// - 链的首切片很小（多数链只有寥寥数字节），随着追加不断升级到更大容量，
///   以均衡内存浪费与转发跳数；
/// - 该表是写入端与读取端的共享协议：两端表不一致属于协议破坏，解码会静默出错，
///   因此表在构造时即被完整校验并永久冻结。
///
/// # 契约说明（What）
/// - `capacities[level]`：该层级切片的总容量（若切片非终端，含尾部 4 字节转发地址）；
/// - `next_level[level]`：该切片之后下一切片使用的层级；不回退，且最高层级映射到自身；
/// - **后置条件**：构造成功后所有访问器均为无失败的纯查询。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceLevelTable {
    capacities: Vec<usize>,
    next_level: Vec<usize>,
}

impl SliceLevelTable {
    /// 以平行数组构造并校验层级表。
    ///
    /// # 契约定义（What）
    /// - **输入参数**：`capacities` 与 `next_level` 必须等长、非空且不超过 16 层；
    ///   容量逐级不减、每层至少 5 字节；`next_level[i] >= i` 且最高层级映射到自身。
    /// - **返回值**：任一约束不满足时返回 [`codes::LAYOUT_INVALID`]，并在消息中指明字段。
    ///
    /// # 执行逻辑（How）
    /// 1. 先做结构性检查（长度、层数上限）；
    /// 2. 再逐项检查容量下限、单调性与推进表的饱和约束。
    pub fn new(capacities: &[usize], next_level: &[usize]) -> Result<Self> {
        if capacities.is_empty() || capacities.len() != next_level.len() {
            return Err(CoreError::new(
                codes::LAYOUT_INVALID,
                "层级表必须非空且容量表与推进表等长",
            ));
        }
        if capacities.len() > MAX_LEVELS {
            return Err(CoreError::new(
                codes::LAYOUT_INVALID,
                format!("层级数 {} 超过上限 {MAX_LEVELS}", capacities.len()),
            ));
        }
        let mut previous = 0usize;
        for (level, &capacity) in capacities.iter().enumerate() {
            if capacity < MIN_CAPACITY {
                return Err(CoreError::new(
                    codes::LAYOUT_INVALID,
                    format!("层级 {level} 容量 {capacity} 低于下限 {MIN_CAPACITY}"),
                ));
            }
            if capacity < previous {
                return Err(CoreError::new(
                    codes::LAYOUT_INVALID,
                    format!("层级 {level} 容量 {capacity} 出现回退，切片容量必须逐级不减"),
                ));
            }
            previous = capacity;
        }
        // 越界与回退检查合并覆盖了饱和约束：最高层级只剩“映射到自身”一种合法取值。
        for (level, &next) in next_level.iter().enumerate() {
            if next >= next_level.len() || next < level {
                return Err(CoreError::new(
                    codes::LAYOUT_INVALID,
                    format!("层级 {level} 的推进目标 {next} 越界或发生回退"),
                ));
            }
        }
        Ok(Self {
            capacities: capacities.to_vec(),
            next_level: next_level.to_vec(),
        })
    }

    /// 层级总数。
    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    /// 层级表恒非空，保留该方法仅为满足与 `len` 成对的惯用约定。
    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }

    /// 指定层级的切片总容量。
    pub fn capacity(&self, level: usize) -> usize {
        self.capacities[level]
    }

    /// 指定层级之后下一切片使用的层级。
    pub fn next(&self, level: usize) -> usize {
        self.next_level[level]
    }

    /// 首切片（层级 0）的容量。
    pub fn first_capacity(&self) -> usize {
        self.capacities[0]
    }

    /// 最大切片容量；容量逐级不减，故取末项即可。
    pub fn max_capacity(&self) -> usize {
        self.capacities[self.capacities.len() - 1]
    }
}

impl Default for SliceLevelTable {
    /// 默认进度表：`[5, 14, 20, 30, 40, 40, 80, 80, 120, 200]` 与逐级加一、
    /// 在最高层饱和的推进表。该取值属于实现配置而非线缆格式，
    /// 但同一池实例的写入端与读取端必须使用同一份。
    fn default() -> Self {
        Self {
            capacities: alloc::vec![5, 14, 20, 30, 40, 40, 80, 80, 120, 200],
            next_level: alloc::vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 9],
        }
    }
}

/// `ChainLayout` 将块尺寸与层级表捆绑为池级共享配置。
///
/// # 设计背景（Why）
/// - 全局地址 = `块下标 * block_size + 块内偏移`；块尺寸限定为 2 的幂，
///   使分解可用移位与掩码完成，避免热路径上的整数除法。
/// - 切片永不跨块，因此块尺寸必须不小于最大切片容量，这一约束在构造时即固化。
///
/// # 契约说明（What）
/// - **前置条件**：`block_size` 为 2 的幂且 `>= levels.max_capacity()`；
/// - **后置条件**：寻址方法均为纯函数，可在读写两端任意调用。
#[derive(Debug, Clone)]
pub struct ChainLayout {
    block_size: usize,
    block_shift: u32,
    block_mask: usize,
    levels: SliceLevelTable,
}

impl ChainLayout {
    /// 校验并构造布局。
    pub fn new(block_size: usize, levels: SliceLevelTable) -> Result<Self> {
        if !block_size.is_power_of_two() {
            return Err(CoreError::new(
                codes::LAYOUT_INVALID,
                format!("块尺寸 {block_size} 必须是 2 的幂"),
            ));
        }
        if block_size < levels.max_capacity() {
            return Err(CoreError::new(
                codes::LAYOUT_INVALID,
                format!(
                    "块尺寸 {block_size} 小于最大切片容量 {}，切片将被迫跨块",
                    levels.max_capacity()
                ),
            ));
        }
        Ok(Self {
            block_size,
            block_shift: block_size.trailing_zeros(),
            block_mask: block_size - 1,
            levels,
        })
    }

    /// 单块字节容量。
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 共享层级表。
    pub fn levels(&self) -> &SliceLevelTable {
        &self.levels
    }

    /// 全局地址所在块的下标。
    pub fn block_index(&self, address: u32) -> usize {
        (address as usize) >> self.block_shift
    }

    /// 全局地址在块内的偏移。
    pub fn offset_in_block(&self, address: u32) -> usize {
        (address as usize) & self.block_mask
    }

    /// 指定块的基准全局地址。
    pub fn block_start(&self, index: usize) -> u32 {
        (index << self.block_shift) as u32
    }
}

impl Default for ChainLayout {
    /// 默认布局：32 KiB 块配合默认层级表，对应原始索引构建场景的常用取值。
    fn default() -> Self {
        let block_size = 1usize << 15;
        Self {
            block_size,
            block_shift: 15,
            block_mask: block_size - 1,
            levels: SliceLevelTable::default(),
        }
    }
}
