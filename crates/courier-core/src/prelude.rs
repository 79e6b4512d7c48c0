//! # courier-core Prelude
//!
//! 实现或组合处理单元时最常用的类型，一次 `use courier_core::prelude::*;` 即可引入。
//! 边缘模块（配置、观测、密钥加载）仍建议使用明确的命名空间。

pub use crate::adapter::{SyncAdapter, SyncProcessor, process_async, process_blocking, processor_fn};
pub use crate::error::{BoxError, EvaluationError, LifecycleError, ProcessingError, UsageError};
pub use crate::exchange::{Exchange, ExchangeId, ExchangePattern};
pub use crate::expression::{Expression, evaluate_as};
pub use crate::lifecycle::{Lifecycle, ServiceState, ServiceSupport, StateAdvance};
pub use crate::message::{DefaultMessage, Message, Value};
pub use crate::processor::{Continuation, ManagedProcessor, Pipeline, Processor};
pub use crate::transform::{SetBodyProcessor, SetHeaderProcessor};
