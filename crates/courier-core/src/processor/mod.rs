//! Processor 子系统：所有路由步骤共享的异步处理契约。
//!
//! # 结构概览
//! - [`Processor`]：唯一的处理入口 `process(exchange, continuation) -> bool`；
//! - [`Continuation`]：一次性延续，由类型系统保证至多调用一次；
//! - [`CompletionWindow`]：判定组合单元的最终完成是否发生在调用窗口之内；
//! - [`ManagedProcessor`]：把处理单元与生命周期驱动器绑在一起，检测 `STARTED` 之外的误用；
//! - [`Pipeline`]：按顺序串联处理单元的组合单元。

mod continuation;
mod managed;
mod pipeline;
mod window;

use std::borrow::Cow;
use std::sync::Arc;

pub use continuation::Continuation;
pub use managed::ManagedProcessor;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use window::CompletionWindow;

use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::lifecycle::Lifecycle;

/// 异步处理单元契约。
///
/// # 设计背景（Why）
/// - 过滤器、转换器、拆分器等所有路由步骤都通过同一个入口消费并修改 [`Exchange`]；
/// - 以显式延续代替阻塞返回，处理单元可以在 I/O 回调等其它执行上下文里完成工作。
///
/// # 契约说明（What）
/// - **所有权**：`exchange` 按值移入，处理单元原地修改后必须把同一个 Exchange 交还给 `done`，
///   不得替换成新的 Exchange；
/// - **完成信号**：`done` 必须被调用恰好一次，且发生在自身全部修改可见之后。`Continuation::done`
///   消耗自身，重复调用在编译期即被拒绝；遗漏调用会被记录为契约误用；
/// - **返回值**：`true` 表示在本次调用内已同步完成（延续收到的标志也为 `true`）；`false` 表示已安排在其它
///   执行上下文稍后完成，调用方此后只能把延续当作唯一的同步点；
/// - **错误**：求值等任何失败都必须在 `process` 内部捕获并通过 [`Exchange::set_failure`] 附着到交换上，
///   之后照常完成；处理单元绝不能让 panic 越过延续调用；
/// - **前置条件**：只能在单元处于 `STARTED` 时调用，由外围引擎保证（[`ManagedProcessor`] 可检测违例）。
pub trait Processor: Lifecycle + Send + Sync {
    fn process(&self, exchange: Exchange, done: Continuation) -> bool;

    /// 供观测工具展示的简短描述，例如 `setBody[constant(HELLO)]`，纯信息性质。
    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<T> Lifecycle for Arc<T>
where
    T: Lifecycle + ?Sized,
{
    fn do_start(&self) -> Result<(), BoxError> {
        (**self).do_start()
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        (**self).do_stop()
    }
}

impl<T> Processor for Arc<T>
where
    T: Processor + ?Sized,
{
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        (**self).process(exchange, done)
    }

    fn trace_label(&self) -> Cow<'_, str> {
        (**self).trace_label()
    }
}

impl<T> Lifecycle for Box<T>
where
    T: Lifecycle + ?Sized,
{
    fn do_start(&self) -> Result<(), BoxError> {
        (**self).do_start()
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        (**self).do_stop()
    }
}

impl<T> Processor for Box<T>
where
    T: Processor + ?Sized,
{
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        (**self).process(exchange, done)
    }

    fn trace_label(&self) -> Cow<'_, str> {
        (**self).trace_label()
    }
}
