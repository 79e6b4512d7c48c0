use std::borrow::Cow;

use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::lifecycle::Lifecycle;
use crate::processor::{Continuation, Processor};

/// 追踪包装：在 `courier.process` span 内调用内部处理单元，并在完成时记录结果。
///
/// # 行为描述（How）
/// - span 携带 `processor`（追踪标签）与 `exchange.id`；
/// - 延续被包装：完成时在同一 span 下以 `debug` 记录 `completed_sync` 与 `failed`，即使完成发生在其它线程；
/// - 生命周期钩子透传给内部单元。
#[derive(Debug, Clone)]
pub struct Traced<P> {
    inner: P,
}

impl<P> Traced<P>
where
    P: Processor,
{
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P> Lifecycle for Traced<P>
where
    P: Processor,
{
    fn do_start(&self) -> Result<(), BoxError> {
        self.inner.do_start()
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        self.inner.do_stop()
    }
}

impl<P> Processor for Traced<P>
where
    P: Processor,
{
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        let label = self.inner.trace_label();
        let span = tracing::debug_span!(
            "courier.process",
            processor = %label,
            exchange.id = %exchange.id(),
        );

        let completion_span = span.clone();
        let observed = Continuation::new(move |exchange: Exchange, completed_sync| {
            completion_span.in_scope(|| {
                tracing::debug!(
                    completed_sync,
                    failed = exchange.is_failed(),
                    "processor completed"
                );
            });
            done.done(exchange, completed_sync);
        })
        .with_owner(label.into_owned());

        let _entered = span.enter();
        self.inner.process(exchange, observed)
    }

    fn trace_label(&self) -> Cow<'_, str> {
        self.inner.trace_label()
    }
}
