use crate::Error;
use alloc::{borrow::Cow, boxed::Box};
use core::fmt;

/// `CoreError` 表示 `flint` 各层共享的稳定错误域，是所有可观察错误的最终形态。
///
/// # 设计背景（Why）
/// - 层级配置校验、池扩容与排空接收器在不同层次产生的故障需要合流为统一的错误码，
///   以便日志与告警系统执行精确分类。
/// - 组件仍需兼容 `no_std + alloc` 场景，因此不直接依赖 `std::error::Error`，而是
///   复用 crate 内部定义的轻量 [`Error`] 抽象。
///
/// # 逻辑解析（How）
/// - 错误码 `code` 始终为 `'static` 字符串，承载稳定语义；`message` 面向排障人员；
///   `cause` 通过 `source()` 暴露完整链路。
/// - 构造后可经由 [`with_cause`](Self::with_cause) 以 Builder 风格叠加底层原因。
///
/// # 契约说明（What）
/// - **前置条件**：调用方必须使用 [`codes`] 模块或遵循 `<域>.<语义>` 约定的自定义码值。
/// - **返回值**：构造函数返回拥有所有权的 `CoreError`，可安全跨线程移动。
/// - **后置条件**：除非显式调用 `with_cause`，错误不会包含底层原因。
///
/// # 设计取舍与风险（Trade-offs）
/// - 采用 `Cow` 保存消息，静态文案零分配、动态描述按需堆分配。
/// - 本类型只负责承载信息，不执行任何格式化或指标上报逻辑；调用方需自行处理。
#[derive(Debug)]
pub struct CoreError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

/// 可跨线程传递的底层错误装箱形态。
pub type ErrorCause = Box<dyn Error + Send + Sync + 'static>;

/// `flint` 统一的结果别名，默认错误类型为 [`CoreError`]。
pub type Result<T, E = CoreError> = core::result::Result<T, E>;

impl CoreError {
    /// 构造核心错误。
    ///
    /// # 契约定义（What）
    /// - `code`：遵循 `<领域>.<语义>` 约定的稳定错误码，建议取自 [`codes`]；
    /// - `message`：面向排障人员的自然语言描述，可为 `&'static str` 或堆分配字符串；
    /// - **后置条件**：返回的错误不含底层原因，可稍后通过 [`with_cause`](Self::with_cause) 填充。
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新的核心错误。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn Error + 'static))
    }
}

/// 链式切片池的稳定错误码集合。
///
/// # 设计背景（Why）
/// - 错误码遵循 `<领域>.<语义>` 命名约定，方便在跨组件日志中检索与聚合；
/// - 与契约共识保持一致：配置校验、地址空间耗尽与接收器失败是本组件仅有的
///   可恢复故障面，其余前置条件破坏一律视为调用方编程错误（debug 断言）。
///
/// # 契约说明（What）
/// - **使用前提**：错误码应由实现者封装进 [`CoreError`]，并携带完整上下文；
/// - **返回承诺**：调用方收到这些错误码后，可据此触发补救措施（修正配置、
///   切换新池实例或处理下游写入失败）。
pub mod codes {
    /// 层级表或块尺寸配置不合法。
    pub const LAYOUT_INVALID: &str = "layout.invalid";
    /// 池的全局地址空间（u32）即将耗尽，无法再分配新块。
    pub const POOL_ADDRESS_OVERFLOW: &str = "pool.address_overflow";
    /// 排空接收器写入失败。
    pub const SINK_WRITE: &str = "sink.write";
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn display_carries_code_and_message() {
        let err = CoreError::new(codes::LAYOUT_INVALID, "块尺寸必须是 2 的幂");
        assert_eq!(err.code(), codes::LAYOUT_INVALID);
        assert_eq!(format!("{err}"), "[layout.invalid] 块尺寸必须是 2 的幂");
        assert!(err.cause().is_none(), "初始错误默认不含底层原因");
    }

    #[test]
    fn cause_is_reachable_through_source() {
        let inner = CoreError::new(codes::SINK_WRITE, "下游容量不足");
        let outer = CoreError::new(codes::SINK_WRITE, "排空中断").with_cause(inner);
        let source = crate::Error::source(&outer).expect("应能取到底层原因");
        assert!(format!("{source}").contains("下游容量不足"));
    }
}
