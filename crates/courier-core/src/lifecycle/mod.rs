//! 生命周期子系统：决定处理单元何时可以接收工作。
//!
//! # 结构概览
//! - [`state`]：纯数据状态机（[`ServiceState`]、[`LifecycleSignal`]、[`LifecycleStateMachine`]）与通用的
//!   [`ContractStateMachine`] 契约；
//! - [`support`]：围绕钩子推进状态机的 [`ServiceSupport`]，以及钩子接口 [`Lifecycle`]。
//!
//! # 设计约束
//! - 转换同步且不可重入；
//! - `New`、`Stopping`、`Stopped`、`Failed` 状态下不得接收工作。

pub mod state;
pub mod support;

pub use state::{
    ContractStateMachine, LifecyclePhase, LifecycleSignal, LifecycleStateMachine, ServiceState,
    StateAdvance,
};
pub use support::{Lifecycle, ServiceSupport};
