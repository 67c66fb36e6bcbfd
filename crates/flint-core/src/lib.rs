#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![allow(private_bounds)]
#![doc = "flint-core: 链式字节切片池（Chained Byte-Slice Pool）的共享契约层。"]
#![doc = ""]
#![doc = "== 职责边界 =="]
#![doc = "本 crate 只承载写入端与读取端都必须认同的三类契约：稳定错误域（`CoreError`）、"]
#![doc = "注入式层级配置（`SliceLevelTable` / `ChainLayout`）以及排空接收器（`ChainSink`）。"]
#![doc = "具体的块池、切片写入器与切片读取器由 `flint-pool` 落地。"]
#![doc = ""]
#![doc = "== 内存分配依赖 =="]
#![doc = "`flint-core` 定位于 `no_std + alloc` 场景：错误链与层级表依赖 [`alloc`] 中的 `Box`、`Vec`。"]
#![doc = "纯 `no_std`（无分配器）环境暂不支持。"]

extern crate alloc;

mod sealed;

pub mod error;
pub mod layout;
pub mod sink;

pub use error::{CoreError, ErrorCause, Result, codes};
pub use layout::{ChainLayout, FORWARD_ADDR_LEN, SliceLevelTable};
pub use sink::ChainSink;

use alloc::boxed::Box;
use core::fmt;

/// `flint` 系列 crate 中所有错误必须实现的 `no_std` 基础 Trait。
///
/// # 设计背景（Why）
/// - `std::error::Error` 在 `no_std` 环境中不可用，因此需要一个对象安全、与平台无关的
///   错误抽象来串联底层错误链。
/// - 该 Trait 作为所有错误类型的“最小公共接口”，帮助池实现与调用方在 `alloc` 场景下
///   完成跨模块错误传递。
///
/// # 逻辑解析（How）
/// - 约束实现者提供 `Debug` 与 `Display`，便于日志与排障输出。
/// - 通过 `source` 方法递归返回链路上的上游错误，保持与 `std::error::Error::source`
///   一致的语义，从而兼容现有生态的错误处理约定。
///
/// # 契约说明（What）
/// - **前置条件**：实现类型必须是 `'static` 生命周期并可安全跨线程传递（若需包装进
///   [`ErrorCause`]）。
/// - **后置条件**：`source` 返回的引用生命周期受限于 `self`，以防悬垂引用。
///
/// # 设计取舍与风险（Trade-offs）
/// - 没有引入 `Send + Sync` 约束，避免对 `no_std` 设备强加多余负担；需要线程安全时
///   请使用 [`ErrorCause`] 类型别名。
/// - 若底层错误不提供 `source`，错误链会在此处终止，这是设计上允许的边界情况。
pub trait Error: fmt::Debug + fmt::Display + sealed::Sealed {
    /// 返回当前错误的上游来源。
    fn source(&self) -> Option<&(dyn Error + 'static)>;
}

impl<E> Error for Box<E>
where
    E: Error + ?Sized,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        (**self).source()
    }
}
