#![deny(unsafe_code)]
#![doc = "courier-core: 中介路由引擎的处理单元契约核心。"]
#![doc = ""]
#![doc = "== 模块速览 =="]
#![doc = "1. `message` / `exchange`：在途工作单元（Exchange）与方向化载荷（Message）的数据模型。"]
#![doc = "2. `lifecycle`：NEW → STARTING → STARTED → STOPPING → STOPPED（外加 FAILED 吸收态）的状态机与驱动器。"]
#![doc = "3. `processor` / `adapter`：延续传递风格的异步处理契约，以及同步/异步两种调用约定之间的桥接。"]
#![doc = "4. `transform` / `expression`：代表性的消息体替换单元与表达式求值边界。"]
#![doc = ""]
#![doc = "== 契约测试 =="]
#![doc = "任何对处理契约的实现或变更，必须同步更新 `courier-contract-tests` 并确保全部套件通过。"]

pub mod adapter;
pub mod config;
pub mod error;
pub mod exchange;
pub mod expression;
pub mod lifecycle;
pub mod message;
pub mod observability;
pub mod prelude;
pub mod processor;
pub mod security;
/// 测试桩命名空间，集中暴露框架维护的探针与桩处理单元，供集成测试与 TCK 复用。
///
/// # 使用方式（How）
/// - 通过 `use courier_core::test_stubs::*;` 引入；
/// - 桩对象只用于测试与示例，生产代码不应依赖。
pub mod test_stubs;
pub mod transform;

pub use adapter::{
    FnProcessor, ProcessFuture, SyncAdapter, SyncProcessor, process_async, process_blocking,
    processor_fn,
};
pub use config::{CourierSettings, TracingSettings, UsageViolationPolicy};
pub use error::{
    BoxError, ConfigError, EvaluationError, LifecycleError, ProcessingError, UsageError,
};
pub use exchange::{Exchange, ExchangeId, ExchangePattern};
pub use expression::{Expression, evaluate_as};
pub use lifecycle::{
    ContractStateMachine, Lifecycle, LifecyclePhase, LifecycleSignal, LifecycleStateMachine,
    ServiceState, ServiceSupport, StateAdvance,
};
pub use message::{
    Attachment, Attachments, DefaultMessage, HeaderCase, Headers, Message, Value,
};
pub use observability::Traced;
pub use processor::{CompletionWindow, Continuation, ManagedProcessor, Pipeline, Processor};
pub use security::{KeyFormat, KeyLoadError, KeyLoader, KeyLocation, PrivateKeyMaterial};
pub use transform::{SetBodyProcessor, SetHeaderProcessor};
