use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{CompletionWindow, Continuation, Processor};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::lifecycle::Lifecycle;

type Stages = Arc<[Arc<dyn Processor>]>;

/// 顺序组合单元：把同一个 Exchange 依次交给每个阶段。
///
/// # 行为描述（How）
/// - 每个阶段的延续负责推进到下一阶段，阶段可以同步完成，也可以在任意线程上稍后完成；
/// - 最后一个阶段完成后，借 [`CompletionWindow`] 判定整体是否仍处于本次 `process` 调用之内，
///   从而保证返回值与传给外部延续的标志一致；
/// - 失败随交换流动：某阶段附着失败后后续阶段照常执行，是否短路由阶段自行决定。
///
/// # 生命周期
/// - `do_start` 按顺序启动阶段；若第 `k` 个失败，已启动的前 `k-1` 个按逆序停止后再返回原错误；
/// - `do_stop` 逆序停止全部阶段，即使中途失败也会继续，最终返回第一个错误。
#[derive(Clone)]
pub struct Pipeline {
    stages: Stages,
}

impl Pipeline {
    pub fn new(stages: impl IntoIterator<Item = Arc<dyn Processor>>) -> Self {
        Self {
            stages: stages.into_iter().collect(),
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> impl Iterator<Item = &Arc<dyn Processor>> {
        self.stages.iter()
    }
}

/// [`Pipeline`] 的构造器。
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Processor>>,
}

impl PipelineBuilder {
    pub fn stage(self, stage: impl Processor + 'static) -> Self {
        self.shared(Arc::new(stage))
    }

    /// 追加一个可能被多处共享的阶段。
    pub fn shared(mut self, stage: Arc<dyn Processor>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(self.stages)
    }
}

/// 单个阶段的交接点：阶段在窗口内完成时，交换与后续延续留给驱动循环取回。
struct Handoff {
    window: CompletionWindow,
    slot: Mutex<Option<(Exchange, Continuation)>>,
}

impl Handoff {
    fn take(&self) -> Option<(Exchange, Continuation)> {
        self.slot.lock().take()
    }
}

/// 从第 `index` 个阶段起驱动遍历。
///
/// 同步完成的阶段在同一栈帧内循环推进，栈深度与阶段数无关；只有在 `process` 返回之后才完成的阶段，
/// 由其延续在完成线程上重新进入本函数。
fn advance(stages: Stages, mut index: usize, mut exchange: Exchange, mut done: Continuation) {
    loop {
        let Some(stage) = stages.get(index).cloned() else {
            done.done(exchange, true);
            return;
        };

        tracing::trace!(
            exchange.id = %exchange.id(),
            stage = index,
            label = %stage.trace_label(),
            "pipeline stage"
        );
        let handoff = Arc::new(Handoff {
            window: CompletionWindow::new(),
            slot: Mutex::new(None),
        });
        let resumed = Arc::clone(&handoff);
        let rest = Arc::clone(&stages);
        let owner = stage.trace_label().into_owned();
        let next = Continuation::new(move |exchange, _| {
            // 先入槽再完成窗口：驱动循环观察到窗口内完成时，槽位必然已就绪。
            *resumed.slot.lock() = Some((exchange, done));
            if !resumed.window.complete() {
                if let Some((exchange, done)) = resumed.take() {
                    advance(rest, index + 1, exchange, done);
                }
            }
        })
        .with_owner(owner);

        stage.process(exchange, next);
        if !handoff.window.close() {
            return;
        }
        let Some((resumed_exchange, resumed_done)) = handoff.take() else {
            return;
        };
        exchange = resumed_exchange;
        done = resumed_done;
        index += 1;
    }
}

impl Processor for Pipeline {
    fn process(&self, exchange: Exchange, done: Continuation) -> bool {
        let window = Arc::new(CompletionWindow::new());
        let observed = Arc::clone(&window);
        let finish = Continuation::new(move |exchange, _| {
            let completed_sync = observed.complete();
            done.done(exchange, completed_sync);
        })
        .with_owner("pipeline");

        advance(Arc::clone(&self.stages), 0, exchange, finish);
        window.close()
    }

    fn trace_label(&self) -> Cow<'_, str> {
        let labels: Vec<_> = self.stages.iter().map(|stage| stage.trace_label()).collect();
        Cow::Owned(format!("pipeline[{}]", labels.join(" -> ")))
    }
}

impl Lifecycle for Pipeline {
    fn do_start(&self) -> Result<(), BoxError> {
        for (index, stage) in self.stages.iter().enumerate() {
            if let Err(err) = stage.do_start() {
                for started in self.stages[..index].iter().rev() {
                    if let Err(rollback) = started.do_stop() {
                        tracing::warn!(
                            stage = %started.trace_label(),
                            error = %rollback,
                            "rollback stop failed"
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn do_stop(&self) -> Result<(), BoxError> {
        let mut first = None;
        for stage in self.stages.iter().rev() {
            if let Err(err) = stage.do_stop() {
                tracing::warn!(stage = %stage.trace_label(), error = %err, "stage stop failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}
