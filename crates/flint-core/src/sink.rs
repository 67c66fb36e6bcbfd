//! 排空接收器契约：链内容的唯一对外输出通道。

use crate::error::{CoreError, Result};
use crate::sealed::Sealed;
use alloc::vec::Vec;
use bytes::{BufMut, BytesMut};

/// `ChainSink` 定义对象安全的字节区间消费契约，服务于读取端的“整链排空”操作。
///
/// # 设计背景（Why）
/// - 读取端按切片逐段产出字节区间，若由调用方逐字节拉取会放大热路径开销；
///   以接收器回调的形式批量推送，可让下游以 `memcpy` 粒度消费。
/// - 采用对象安全 Trait 而非泛型，读取端得以在组件边界进行动态调度，
///   与本工作区缓冲契约（`ReadableBuffer`/`WritableBuffer`）的取舍一致。
///
/// # 契约说明（What）
/// - **输入参数**：`chunk` 为只读字节区间，可能为空；调用顺序即链内字节顺序。
/// - **返回值**：失败时返回的错误会被读取端原样向上传播，不做包装或吞并；
///   已写入的前序区间不会被撤回（无回滚语义）。
/// - **前置条件**：同一接收器实例不得被并发调用，需由调用方保证互斥。
///
/// # 设计取舍与风险（Trade-offs）
/// - 接收器的阻塞行为对读取端不透明：排空操作的时延由下游决定。
/// - 错误建议携带 [`crate::codes::SINK_WRITE`] 或自定义稳定码，便于日志聚合。
pub trait ChainSink: Sealed {
    /// 按链内顺序消费一段字节区间。
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CoreError>;
}

/// 最朴素的接收器：把链内容顺序追加进 `Vec<u8>`，不会失败。
impl ChainSink for Vec<u8> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CoreError> {
        self.extend_from_slice(chunk);
        Ok(())
    }
}

/// 面向零拷贝流水线的接收器：追加进 `BytesMut`，便于随后 `freeze` 为只读视图。
impl ChainSink for BytesMut {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CoreError> {
        self.put_slice(chunk);
        Ok(())
    }
}
