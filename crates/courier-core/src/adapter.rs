//! 同步与异步调用约定之间的桥接。
//!
//! # 结构概览
//! - 同步 → 异步：[`SyncProcessor`] 描述只会同步完成的处理单元，[`SyncAdapter`] 把它呈现为 [`Processor`]；
//!   [`processor_fn`] 直接以闭包构造；
//! - 异步 → 同步/原生异步：[`process_async`] 把延续转换成 [`ProcessFuture`]，[`process_blocking`] 在当前线程
//!   上阻塞等待完成。

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::{ProcessingError, UsageError};
use crate::exchange::Exchange;
use crate::lifecycle::Lifecycle;
use crate::processor::{Continuation, Processor};

/// 严格同步的处理单元。
///
/// 实现方原地修改交换，出错时返回 `Err`；适配器负责把错误附着到交换并发出完成信号。
pub trait SyncProcessor: Lifecycle + Send + Sync {
    fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessingError>;

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

/// 把 [`SyncProcessor`] 呈现为异步契约的适配器，总是同步完成。
#[derive(Debug, Clone)]
pub struct SyncAdapter<P> {
    inner: P,
}

impl<P> SyncAdapter<P>
where
    P: SyncProcessor,
{
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P> Lifecycle for SyncAdapter<P>
where
    P: SyncProcessor,
{
    fn do_start(&self) -> Result<(), crate::BoxError> {
        self.inner.do_start()
    }

    fn do_stop(&self) -> Result<(), crate::BoxError> {
        self.inner.do_stop()
    }
}

impl<P> Processor for SyncAdapter<P>
where
    P: SyncProcessor,
{
    fn process(&self, mut exchange: Exchange, done: Continuation) -> bool {
        if let Err(err) = self.inner.process(&mut exchange) {
            tracing::debug!(
                exchange.id = %exchange.id(),
                processor = %self.inner.trace_label(),
                error = %err,
                "processing failure captured"
            );
            exchange.set_failure(err);
        }
        done.done(exchange, true);
        true
    }

    fn trace_label(&self) -> Cow<'_, str> {
        self.inner.trace_label()
    }
}

/// 由闭包构造的同步处理单元，生命周期钩子为空。
pub struct FnProcessor<F> {
    label: Cow<'static, str>,
    f: F,
}

impl<F> Lifecycle for FnProcessor<F> {}

impl<F> SyncProcessor for FnProcessor<F>
where
    F: Fn(&mut Exchange) -> Result<(), ProcessingError> + Send + Sync,
{
    fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessingError> {
        (self.f)(exchange)
    }

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }
}

impl<F> fmt::Debug for FnProcessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcessor")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// 以标签和闭包构造一个已适配到异步契约的处理单元。
///
/// ```
/// use courier_core::{Exchange, Message, processor_fn};
///
/// let upper = processor_fn("upper", |exchange: &mut Exchange| {
///     let body = exchange.current().body().and_then(|b| b.as_str()).unwrap_or_default().to_uppercase();
///     exchange.current_mut().set_body(body.into());
///     Ok(())
/// });
/// let exchange = courier_core::process_blocking(&upper, Exchange::with_body("hi")).unwrap();
/// assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("HI"));
/// ```
pub fn processor_fn<F>(label: impl Into<Cow<'static, str>>, f: F) -> SyncAdapter<FnProcessor<F>>
where
    F: Fn(&mut Exchange) -> Result<(), ProcessingError> + Send + Sync,
{
    SyncAdapter::new(FnProcessor {
        label: label.into(),
        f,
    })
}

/// 异步处理的结果 Future，在延续被调用时就绪。
#[derive(Debug)]
pub struct ProcessFuture {
    completed_sync: bool,
    unit: String,
    receiver: oneshot::Receiver<Exchange>,
}

impl ProcessFuture {
    /// `process` 的返回值：为 `true` 时 Future 已经就绪。
    pub fn completed_sync(&self) -> bool {
        self.completed_sync
    }
}

impl Future for ProcessFuture {
    type Output = Result<Exchange, UsageError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(exchange)) => Poll::Ready(Ok(exchange)),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(UsageError::ContinuationDropped {
                unit: this.unit.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// 以原生 Future 形式调用处理单元。
///
/// 处理单元的返回值保存在 [`ProcessFuture::completed_sync`]；延续未被调用即被丢弃时，Future 以
/// [`UsageError::ContinuationDropped`] 结束，而不是永远挂起。
pub fn process_async<P>(processor: &P, exchange: Exchange) -> ProcessFuture
where
    P: Processor + ?Sized,
{
    let unit = processor.trace_label().into_owned();
    let (sender, receiver) = oneshot::channel();
    let continuation = Continuation::new(move |exchange, _| {
        // 接收端已放弃等待时直接丢弃结果。
        let _ = sender.send(exchange);
    })
    .with_owner(unit.clone());
    let completed_sync = processor.process(exchange, continuation);
    ProcessFuture {
        completed_sync,
        unit,
        receiver,
    }
}

/// 在当前线程上阻塞直到处理完成。
///
/// 不得在异步运行时的工作线程里调用。
pub fn process_blocking<P>(processor: &P, exchange: Exchange) -> Result<Exchange, UsageError>
where
    P: Processor + ?Sized,
{
    futures::executor::block_on(process_async(processor, exchange))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::message::Message;

    #[test]
    fn sync_adapter_completes_inline() {
        let stamp = processor_fn("stamp", |exchange: &mut Exchange| {
            exchange.current_mut().set_header("stamped", true.into());
            Ok(())
        });

        let future = process_async(&stamp, Exchange::with_body("x"));
        assert!(future.completed_sync());
        let exchange = futures::executor::block_on(future).expect("应完成");
        assert!(exchange.current().header("stamped").is_some());
        assert!(!exchange.is_failed());
    }

    #[test]
    fn sync_adapter_captures_error() {
        let failing = processor_fn("failing", |_: &mut Exchange| {
            Err(EvaluationError::failed("boom()", "always fails").into())
        });

        let exchange = process_blocking(&failing, Exchange::with_body("x")).expect("应完成");
        assert!(exchange.failure().is_some_and(ProcessingError::is_evaluation));
        assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("x"));
    }

    #[test]
    fn dropped_continuation_surfaces_usage_error() {
        struct Forgetful;
        impl Lifecycle for Forgetful {}
        impl Processor for Forgetful {
            fn process(&self, _exchange: Exchange, done: Continuation) -> bool {
                drop(done);
                true
            }

            fn trace_label(&self) -> Cow<'_, str> {
                Cow::Borrowed("forgetful")
            }
        }

        let err = process_blocking(&Forgetful, Exchange::with_body("x")).expect_err("应报告误用");
        assert!(matches!(err, UsageError::ContinuationDropped { unit } if unit == "forgetful"));
    }
}
