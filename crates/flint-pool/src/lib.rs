#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

//! `flint-pool` 提供链式字节切片池的完整实现。
//!
//! # 模块定位（Why）
//! - 为倒排索引构建期的变长追加序列提供“少量大块 + 切片链”的池化存储，
//!   替代逐序列分配；写入端与读取端通过 [`flint-core`](flint_core) 中的
//!   共享契约（层级表、布局、排空接收器）协作。
//! - 补足 `flint-core` 仅定义契约、不落地实体的问题：本 crate 给出块池、
//!   追加游标与顺序读取器三件套。
//!
//! # 设计概要（How）
//! - `pool` 模块实现 [`BytePool`]：定长零填充块的有序集合，承载切片
//!   分配与升级（转发地址的安装方）；
//! - `writer` 模块实现 [`SliceWriter`]：单链追加游标，状态最小化为一个
//!   `u32`，切片边界信息编码在池字节内；
//! - `reader` 模块实现 [`SliceReader`]：本池的解码核心，重放层级推进
//!   序列，跳过转发字节，支持逐字节、批量与整链排空三种消费形态。
//!
//! # 命名约定（Consistency）
//! - 延续 `flint-core` 的术语：链（chain）、切片（slice）、层级（level）、
//!   转发地址（forwarding address），避免引入同义新词。

extern crate alloc;

mod pool;
mod reader;
mod writer;

pub use pool::{BytePool, PoolUsage};
pub use reader::SliceReader;
pub use writer::SliceWriter;
