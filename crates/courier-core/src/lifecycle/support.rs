use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;

use super::state::{
    ContractStateMachine, LifecyclePhase, LifecycleSignal, LifecycleStateMachine, ServiceState,
    StateAdvance,
};
use crate::error::{BoxError, LifecycleError};

/// 处理单元的启动/停止钩子。
///
/// 无状态单元可以直接使用默认的空实现：即便钩子什么都不做，状态机依旧强制顺序。
pub trait Lifecycle {
    /// 启动钩子，报错会使单元进入 `FAILED`。
    fn do_start(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// 停止钩子，报错会使单元进入 `FAILED`。
    fn do_stop(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 生命周期驱动器：围绕 [`Lifecycle`] 钩子推进 [`LifecycleStateMachine`]。
///
/// # 行为描述（How）
/// - `start`：`New`/`Stopped` 时进入 `Starting`，释放锁后执行 `do_start`，再根据结果进入 `Started` 或 `Failed`；
/// - `stop`：`Started` 时进入 `Stopping`，执行 `do_stop` 后进入 `Stopped` 或 `Failed`；
/// - 钩子执行期间不持有锁，嵌套调用只会观察到中间态并得到 `Noop` 或
///   [`LifecycleError::TransitionInProgress`]，不会死锁。
///
/// # 契约说明（What）
/// - 重复启动/停止返回 `Noop`；
/// - 停止从未启动的单元是 `Noop`，状态保持 `New`；
/// - `Failed` 为吸收态：再次启动返回 [`LifecycleError::PermanentlyFailed`]，停止返回 `Noop`；
/// - 钩子 panic 等同于返回 `Err`：单元进入 `Failed`，panic 被转换为 `StartFailed`/`StopFailed`；
/// - 调用方负责串行化 start/stop，本类型只保证状态读写本身的原子性。
#[derive(Debug)]
pub struct ServiceSupport {
    name: Cow<'static, str>,
    machine: Mutex<LifecycleStateMachine>,
}

enum Gate {
    Proceed(ServiceState),
    Settled(ServiceState),
    Reject(LifecycleError),
}

impl ServiceSupport {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            machine: Mutex::new(LifecycleStateMachine::new()),
        }
    }

    /// 单元名称，出现在日志与错误中。
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ServiceState {
        self.machine.lock().state()
    }

    pub fn is_started(&self) -> bool {
        self.state().accepts_work()
    }

    pub fn start(&self, hooks: &dyn Lifecycle) -> Result<StateAdvance<ServiceState>, LifecycleError> {
        self.drive(LifecyclePhase::Start, || hooks.do_start())
    }

    pub fn stop(&self, hooks: &dyn Lifecycle) -> Result<StateAdvance<ServiceState>, LifecycleError> {
        self.drive(LifecyclePhase::Stop, || hooks.do_stop())
    }

    fn gate(&self, phase: LifecyclePhase, state: ServiceState) -> Gate {
        use ServiceState as St;

        match (phase, state) {
            (LifecyclePhase::Start, St::New | St::Stopped) => Gate::Proceed(state),
            (LifecyclePhase::Start, St::Starting | St::Started) => Gate::Settled(state),
            (LifecyclePhase::Start, St::Failed) => {
                Gate::Reject(LifecycleError::PermanentlyFailed {
                    unit: self.name.to_string(),
                })
            }
            (LifecyclePhase::Stop, St::Started) => Gate::Proceed(state),
            (LifecyclePhase::Start, St::Stopping) | (LifecyclePhase::Stop, St::Starting) => {
                Gate::Reject(LifecycleError::TransitionInProgress {
                    unit: self.name.to_string(),
                    state,
                    requested: phase,
                })
            }
            (LifecyclePhase::Stop, _) => Gate::Settled(state),
        }
    }

    fn drive(
        &self,
        phase: LifecyclePhase,
        hook: impl FnOnce() -> Result<(), BoxError>,
    ) -> Result<StateAdvance<ServiceState>, LifecycleError> {
        let (requested, succeeded, failed) = match phase {
            LifecyclePhase::Start => (
                LifecycleSignal::StartRequested,
                LifecycleSignal::StartSucceeded,
                LifecycleSignal::StartFailed,
            ),
            LifecyclePhase::Stop => (
                LifecycleSignal::StopRequested,
                LifecycleSignal::StopSucceeded,
                LifecycleSignal::StopFailed,
            ),
        };

        let from = {
            let mut machine = self.machine.lock();
            match self.gate(phase, machine.state()) {
                Gate::Proceed(from) => {
                    machine.on_signal(&requested);
                    from
                }
                Gate::Settled(state) => return Ok(StateAdvance::Noop { state }),
                Gate::Reject(err) => return Err(err),
            }
        };

        tracing::debug!(unit = %self.name, %phase, "lifecycle hook running");
        let outcome = panic::catch_unwind(AssertUnwindSafe(hook))
            .unwrap_or_else(|payload| Err(hook_panicked(phase, payload.as_ref())));

        let mut machine = self.machine.lock();
        match outcome {
            Ok(()) => {
                let advance = machine.on_signal(&succeeded);
                tracing::info!(unit = %self.name, from = %from, to = %advance.state(), "lifecycle transition");
                Ok(StateAdvance::Transition {
                    from,
                    to: advance.state(),
                })
            }
            Err(source) => {
                machine.on_signal(&failed);
                tracing::error!(unit = %self.name, %phase, error = %source, "lifecycle hook failed");
                let unit = self.name.to_string();
                Err(match phase {
                    LifecyclePhase::Start => LifecycleError::StartFailed { unit, source },
                    LifecyclePhase::Stop => LifecycleError::StopFailed { unit, source },
                })
            }
        }
    }
}

/// 钩子 panic 与返回 `Err` 同样视为失败，panic 信息成为错误来源。
fn hook_panicked(phase: LifecyclePhase, payload: &(dyn Any + Send)) -> BoxError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    format!("{phase} hook panicked: {message}").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingHooks {
        starts: Cell<u32>,
        stops: Cell<u32>,
        fail_start: bool,
    }

    impl Lifecycle for CountingHooks {
        fn do_start(&self) -> Result<(), BoxError> {
            self.starts.set(self.starts.get() + 1);
            if self.fail_start {
                return Err("port already bound".into());
            }
            Ok(())
        }

        fn do_stop(&self) -> Result<(), BoxError> {
            self.stops.set(self.stops.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn start_and_stop_run_hooks_once() {
        let support = ServiceSupport::new("unit");
        let hooks = CountingHooks::default();

        let advance = support.start(&hooks).expect("启动应成功");
        assert_eq!(
            advance,
            StateAdvance::Transition {
                from: ServiceState::New,
                to: ServiceState::Started
            }
        );
        assert!(support.start(&hooks).is_ok_and(|a| !a.is_transition()));
        assert_eq!(hooks.starts.get(), 1);

        support.stop(&hooks).expect("停止应成功");
        support.stop(&hooks).expect("重复停止应为 Noop");
        assert_eq!(hooks.stops.get(), 1);
        assert_eq!(support.state(), ServiceState::Stopped);
    }

    #[test]
    fn stop_before_start_is_noop() {
        let support = ServiceSupport::new("unit");
        let hooks = CountingHooks::default();
        let advance = support.stop(&hooks).expect("停止未启动单元不应报错");
        assert_eq!(
            advance,
            StateAdvance::Noop {
                state: ServiceState::New
            }
        );
        assert_eq!(hooks.stops.get(), 0);
    }

    #[test]
    fn failed_start_is_permanent() {
        let support = ServiceSupport::new("listener");
        let hooks = CountingHooks {
            fail_start: true,
            ..CountingHooks::default()
        };

        let err = support.start(&hooks).expect_err("钩子失败应返回错误");
        assert!(matches!(err, LifecycleError::StartFailed { .. }));
        assert_eq!(support.state(), ServiceState::Failed);

        let err = support.start(&hooks).expect_err("FAILED 不可再启动");
        assert!(matches!(err, LifecycleError::PermanentlyFailed { .. }));
        assert_eq!(hooks.starts.get(), 1);
        assert!(support.stop(&hooks).is_ok_and(|a| a.state() == ServiceState::Failed));
    }

    #[test]
    fn nested_start_observes_starting() {
        struct Reentrant<'a> {
            support: &'a ServiceSupport,
            nested: Cell<Option<ServiceState>>,
        }

        impl Lifecycle for Reentrant<'_> {
            fn do_start(&self) -> Result<(), BoxError> {
                let advance = self.support.start(&NoHooks)?;
                self.nested.set(Some(advance.state()));
                Ok(())
            }
        }

        struct NoHooks;
        impl Lifecycle for NoHooks {}

        let support = ServiceSupport::new("reentrant");
        let hooks = Reentrant {
            support: &support,
            nested: Cell::new(None),
        };
        support.start(&hooks).expect("外层启动应成功");
        assert_eq!(hooks.nested.get(), Some(ServiceState::Starting));
        assert_eq!(support.state(), ServiceState::Started);
    }

    struct PanickingHooks {
        on_start: bool,
    }

    impl Lifecycle for PanickingHooks {
        fn do_start(&self) -> Result<(), BoxError> {
            if self.on_start {
                panic!("config file vanished");
            }
            Ok(())
        }

        fn do_stop(&self) -> Result<(), BoxError> {
            panic!("socket already closed");
        }
    }

    #[test]
    fn panicking_start_hook_moves_to_failed() {
        let support = ServiceSupport::new("panicky");
        let hooks = PanickingHooks { on_start: true };

        let err = support.start(&hooks).expect_err("钩子 panic 应返回错误");
        match err {
            LifecycleError::StartFailed { source, .. } => {
                assert_eq!(source.to_string(), "start hook panicked: config file vanished");
            }
            other => panic!("应为 StartFailed，实际为 {other:?}"),
        }
        assert_eq!(support.state(), ServiceState::Failed);
        assert!(matches!(
            support.start(&hooks),
            Err(LifecycleError::PermanentlyFailed { .. })
        ));
    }

    #[test]
    fn panicking_stop_hook_moves_to_failed() {
        let support = ServiceSupport::new("panicky");
        let hooks = PanickingHooks { on_start: false };
        support.start(&hooks).expect("启动钩子正常");

        let err = support.stop(&hooks).expect_err("钩子 panic 应返回错误");
        assert!(matches!(err, LifecycleError::StopFailed { .. }));
        assert!(err.to_string().contains("failed to stop"));
        assert_eq!(support.state(), ServiceState::Failed);
        assert!(support.stop(&hooks).is_ok_and(|a| a.state() == ServiceState::Failed));
    }
}
