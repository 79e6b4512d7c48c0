//! 处理契约测试中反复用到的探针与桩处理单元。
//!
//! # 设计定位（Why）
//! - 集成测试、TCK 与第三方实现都需要“数一数延续被调用了几次”“模拟在其它线程完成”之类的工具；
//! - 集中在这里维护，接口调整时只需改一处。
//!
//! # 契约说明（What）
//! - 所有桩都满足 `Send + Sync`，可以跨线程共享；
//! - 仅用于测试与示例，生产代码不应依赖。

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::lifecycle::Lifecycle;
use crate::processor::{Continuation, Processor};

#[derive(Default)]
struct ProbeState {
    calls: AtomicUsize,
    slot: Mutex<Option<(Exchange, bool)>>,
    ready: Condvar,
}

/// 计数型延续探针。
///
/// 每次调用 [`continuation`](Self::continuation) 得到一个新的延续；任意一个被调用时计数加一，
/// 并保存最近一次交回的 Exchange 与同步标志。
#[derive(Clone, Default)]
pub struct CompletionProbe {
    state: Arc<ProbeState>,
}

impl CompletionProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn continuation(&self) -> Continuation {
        let state = Arc::clone(&self.state);
        Continuation::new(move |exchange, completed_sync| {
            state.calls.fetch_add(1, Ordering::SeqCst);
            *state.slot.lock() = Some((exchange, completed_sync));
            state.ready.notify_all();
        })
        .with_owner("completion-probe")
    }

    /// 延续累计被调用的次数。
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// 最近一次完成的同步标志，尚未完成时为 `None`。
    pub fn completed_sync(&self) -> Option<bool> {
        self.state.slot.lock().as_ref().map(|(_, sync)| *sync)
    }

    /// 取走最近一次交回的 Exchange 与同步标志。
    pub fn take(&self) -> Option<(Exchange, bool)> {
        self.state.slot.lock().take()
    }

    /// 等待完成，超时返回 `None`。
    pub fn wait(&self, timeout: Duration) -> Option<(Exchange, bool)> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.state.slot.lock();
        while slot.is_none() {
            if self.state.ready.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        slot.take()
    }
}

/// 异步完成的包装：把内部处理单元挪到新线程执行，调用方立即得到 `false`。
///
/// 内部单元即使在新线程里同步完成，交给外部延续的标志也总是 `false`。
#[derive(Debug)]
pub struct DeferredProcessor<P> {
    inner: Arc<P>,
    delay: Duration,
}

impl<P> DeferredProcessor<P>
where
    P: Processor + 'static,
{
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
            delay: Duration::ZERO,
        }
    }

    /// 在新线程上开始处理前先休眠一段时间。
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl<P> Lifecycle for DeferredProcessor<P>
where
    P: Processor + 'static,
{
    fn do_start(&self) -> Result<(), BoxError> {
        self.inner.do_start()
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        self.inner.do_stop()
    }
}

impl<P> Processor for DeferredProcessor<P>
where
    P: Processor + 'static,
{
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        let inner = Arc::clone(&self.inner);
        let delay = self.delay;
        thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            let label = inner.trace_label().into_owned();
            inner.process(
                exchange,
                Continuation::new(move |exchange, _| done.done(exchange, false)).with_owner(label),
            );
        });
        false
    }

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("deferred[{}]", self.inner.trace_label()))
    }
}

/// 生命周期钩子可配置失败的直通处理单元，同时统计钩子调用次数。
#[derive(Debug, Default)]
pub struct FailingHooks {
    fail_start: bool,
    fail_stop: bool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FailingHooks {
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Lifecycle for FailingHooks {
    fn do_start(&self) -> Result<(), BoxError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err("start hook failed".into());
        }
        Ok(())
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err("stop hook failed".into());
        }
        Ok(())
    }
}

impl Processor for FailingHooks {
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        done.done(exchange, true);
        true
    }

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Borrowed("failing-hooks")
    }
}

/// 多个处理单元共享的事件日志。
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

/// 把处理与生命周期事件写入 [`EventLog`] 的直通处理单元。
///
/// 事件格式：`process:<label>`、`start:<label>`、`stop:<label>`。
#[derive(Debug)]
pub struct RecordingProcessor {
    label: Cow<'static, str>,
    log: EventLog,
    fail_start: bool,
}

impl RecordingProcessor {
    pub fn new(label: impl Into<Cow<'static, str>>, log: EventLog) -> Self {
        Self {
            label: label.into(),
            log,
            fail_start: false,
        }
    }

    /// 启动钩子记录事件后失败。
    pub fn with_failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }
}

impl Lifecycle for RecordingProcessor {
    fn do_start(&self) -> Result<(), BoxError> {
        self.log.record(format!("start:{}", self.label));
        if self.fail_start {
            return Err(format!("{} refused to start", self.label).into());
        }
        Ok(())
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        self.log.record(format!("stop:{}", self.label));
        Ok(())
    }
}

impl Processor for RecordingProcessor {
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        self.log.record(format!("process:{}", self.label));
        done.done(exchange, true);
        true
    }

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }
}
