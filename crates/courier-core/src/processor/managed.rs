use std::borrow::Cow;

use super::{Continuation, Processor};
use crate::config::UsageViolationPolicy;
use crate::error::{BoxError, LifecycleError, UsageError};
use crate::exchange::Exchange;
use crate::lifecycle::{Lifecycle, ServiceState, ServiceSupport, StateAdvance};

/// 受管处理单元：把任意 [`Processor`] 与 [`ServiceSupport`] 绑定。
///
/// # 设计背景（Why）
/// - 处理单元自身只描述“如何处理”，而“何时允许处理”由生命周期决定；
/// - 在 `STARTED` 之外调用 `process` 属于宿主引擎的误用，本类型负责把它暴露出来。
///
/// # 行为描述（How）
/// - `start`/`stop` 委托给 [`ServiceSupport`]，钩子即内部单元的 [`Lifecycle`] 实现；
/// - `process` 先检查状态：`Started` 时直接转发；否则构造 [`UsageError::NotStarted`]，
///   按 [`UsageViolationPolicy`] 附着为失败并同步完成（`Capture`）或直接 panic（`Panic`）。
///
/// # 契约说明（What）
/// - 作为 [`Lifecycle`] 使用时（例如嵌入 [`Pipeline`](super::Pipeline)），`do_start`/`do_stop`
///   会驱动自身状态机，外层组合单元由此获得逐阶段的状态追踪。
#[derive(Debug)]
pub struct ManagedProcessor<P> {
    inner: P,
    support: ServiceSupport,
    policy: UsageViolationPolicy,
}

impl<P> ManagedProcessor<P>
where
    P: Processor,
{
    pub fn new(inner: P) -> Self {
        let name = inner.trace_label().into_owned();
        Self {
            inner,
            support: ServiceSupport::new(name),
            policy: UsageViolationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UsageViolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn start(&self) -> Result<StateAdvance<ServiceState>, LifecycleError> {
        self.support.start(&self.inner)
    }

    pub fn stop(&self) -> Result<StateAdvance<ServiceState>, LifecycleError> {
        self.support.stop(&self.inner)
    }

    pub fn state(&self) -> ServiceState {
        self.support.state()
    }

    pub fn policy(&self) -> UsageViolationPolicy {
        self.policy
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P> Lifecycle for ManagedProcessor<P>
where
    P: Processor,
{
    fn do_start(&self) -> Result<(), BoxError> {
        self.start().map(|_| ()).map_err(BoxError::from)
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        self.stop().map(|_| ()).map_err(BoxError::from)
    }
}

impl<P> Processor for ManagedProcessor<P>
where
    P: Processor,
{
    fn process(&self, mut exchange: Exchange, done: Continuation) -> bool {
        let state = self.support.state();
        if state.accepts_work() {
            return self.inner.process(exchange, done);
        }

        let violation = UsageError::NotStarted {
            unit: self.support.name().to_owned(),
            state,
        };
        match self.policy {
            UsageViolationPolicy::Panic => panic!("{violation}"),
            UsageViolationPolicy::Capture => {
                tracing::error!(
                    exchange.id = %exchange.id(),
                    error = %violation,
                    "processor invoked outside STARTED"
                );
                exchange.set_failure(violation);
                done.done(exchange, true);
                true
            }
        }
    }

    fn trace_label(&self) -> Cow<'_, str> {
        self.inner.trace_label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Echo;

    impl Lifecycle for Echo {}

    impl Processor for Echo {
        fn process(&self, exchange: Exchange, done: Continuation) -> bool {
            done.done(exchange, true);
            true
        }

        fn trace_label(&self) -> Cow<'_, str> {
            Cow::Borrowed("echo")
        }
    }

    fn capture() -> (Arc<Mutex<Option<Exchange>>>, Continuation) {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        let continuation = Continuation::new(move |exchange, _| {
            *sink.lock() = Some(exchange);
        });
        (slot, continuation)
    }

    #[test]
    fn rejects_work_before_start() {
        let managed = ManagedProcessor::new(Echo);
        let (slot, done) = capture();

        assert!(managed.process(Exchange::with_body("x"), done));

        let exchange = slot.lock().take().expect("应同步完成");
        assert!(matches!(
            exchange.failure(),
            Some(ProcessingError::Usage(UsageError::NotStarted {
                state: ServiceState::New,
                ..
            }))
        ));
    }

    #[test]
    fn forwards_work_once_started() {
        let managed = ManagedProcessor::new(Echo);
        managed.start().expect("启动应成功");
        let (slot, done) = capture();

        assert!(managed.process(Exchange::with_body("x"), done));
        assert!(!slot.lock().take().expect("应同步完成").is_failed());

        managed.stop().expect("停止应成功");
        let (slot, done) = capture();
        managed.process(Exchange::with_body("y"), done);
        assert!(slot.lock().take().expect("应同步完成").is_failed());
    }

    #[test]
    #[should_panic(expected = "received work while")]
    fn panic_policy_aborts() {
        let managed = ManagedProcessor::new(Echo).with_policy(UsageViolationPolicy::Panic);
        managed.process(Exchange::with_body("x"), Continuation::noop());
    }
}
