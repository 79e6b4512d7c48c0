//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义处理契约涉及的三类错误：求值失败（[`EvaluationError`]）、生命周期钩子失败
//!   （[`LifecycleError`]）与契约误用（[`UsageError`]）；
//! - [`ProcessingError`] 是挂在 [`Exchange`](crate::Exchange) 上随数据流动的失败载体。
//!
//! ## 传播规则（What）
//! - `EvaluationError` 永远在处理单元内部被捕获，并通过 `Exchange::set_failure` 暴露，绝不穿过 `process`；
//! - `LifecycleError` 返回给驱动状态机的一方，对应单元随即进入 `FAILED`；
//! - `UsageError` 属于编程缺陷，实现可以选择记录到交换上或直接 panic（见 [`UsageViolationPolicy`](crate::UsageViolationPolicy)）。

use std::path::PathBuf;

use thiserror::Error;

use crate::lifecycle::{LifecyclePhase, ServiceState};

/// 装箱的底层错误来源，统一要求 `Send + Sync + 'static` 以便跨线程携带。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 表达式求值失败。
///
/// # 契约说明（What）
/// - `expression` 字段保存表达式的可读描述（即其 `Display` 输出），用于日志与排障；
/// - 所有变体都可以无损转换为 [`ProcessingError::Evaluation`]。
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// 表达式自身报告失败。
    #[error("expression `{expression}` failed: {reason}")]
    Failed { expression: String, reason: String },

    /// 表达式求值依赖的 Header 不存在。
    #[error("expression `{expression}` requires header `{name}` which is not present")]
    MissingHeader { expression: String, name: String },

    /// 求值结果无法在边界处强转为调用方期望的类型。
    #[error("expression `{expression}` produced `{actual}`, expected `{expected}`")]
    TypeMismatch {
        expression: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// 被包装的外部求值引擎错误。
    #[error("expression `{expression}` raised an error")]
    Source {
        expression: String,
        #[source]
        source: BoxError,
    },
}

impl EvaluationError {
    /// 以表达式描述与原因构造通用失败。
    pub fn failed(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// 生命周期钩子或状态推进失败。
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `do_start` 钩子返回错误，单元已进入 `FAILED`。
    #[error("unit `{unit}` failed to start")]
    StartFailed {
        unit: String,
        #[source]
        source: BoxError,
    },

    /// `do_stop` 钩子返回错误，单元已进入 `FAILED`。
    #[error("unit `{unit}` failed to stop")]
    StopFailed {
        unit: String,
        #[source]
        source: BoxError,
    },

    /// 单元处于 `FAILED` 吸收态，拒绝再次启动。
    #[error("unit `{unit}` is permanently failed and cannot be started")]
    PermanentlyFailed { unit: String },

    /// 另一方向的转换尚未完成（例如启动期间请求停止）。
    #[error("unit `{unit}` is {state}; cannot begin {requested} until it settles")]
    TransitionInProgress {
        unit: String,
        state: ServiceState,
        requested: LifecyclePhase,
    },
}

/// 处理契约被违反。
///
/// 这一类错误说明调用方存在缺陷，而非运行期可恢复的状况。
#[derive(Debug, Error)]
pub enum UsageError {
    /// 在 `STARTED` 之外调用了 `process`。
    #[error("processor `{unit}` received work while {state}")]
    NotStarted { unit: String, state: ServiceState },

    /// 延续在未被调用的情况下被丢弃，调用方将永远等不到完成信号。
    #[error("continuation of `{unit}` was dropped without signalling completion")]
    ContinuationDropped { unit: String },
}

/// 附着在交换上的处理失败。
///
/// # 契约说明（What）
/// - 通过 [`Exchange::set_failure`](crate::Exchange::set_failure) 写入，后写覆盖先写；
/// - 下游处理单元可以检查失败并自行决定是否短路，框架本身不会中止遍历。
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// 表达式求值失败。
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// 契约误用被捕获。
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// 处理单元自身报告的失败。
    #[error("processor `{processor}` failed")]
    Processor {
        processor: String,
        #[source]
        source: BoxError,
    },
}

impl ProcessingError {
    /// 将任意错误包装为特定处理单元的失败。
    pub fn processor(processor: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Processor {
            processor: processor.into(),
            source: source.into(),
        }
    }

    /// 是否源自表达式求值。
    pub fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation(_))
    }

    /// 是否源自契约误用。
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// 配置加载失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败。
    #[error("failed to read configuration file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析或字段校验失败。
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
}
