//! 生命周期契约测试
//!
//! - **核心目标 (Why)**：确认受管处理单元只在 `STARTED` 期间接收工作，钩子失败后进入吸收态 `FAILED`；
//! - **执行策略 (How)**：以 [`ManagedProcessor`] 包裹测试桩，驱动 start/stop 并在每个状态下投递交换。

use courier_core::expression::constant;
use courier_core::test_stubs::{CompletionProbe, FailingHooks};
use courier_core::{
    Exchange, LifecycleError, ManagedProcessor, Message, ProcessingError, Processor, ServiceState,
    SetBodyProcessor, StateAdvance, UsageError,
};

fn deliver(processor: &dyn Processor) -> Exchange {
    let probe = CompletionProbe::new();
    processor.process(Exchange::with_body("hello"), probe.continuation());
    assert_eq!(probe.calls(), 1);
    probe.take().expect("应同步完成").0
}

fn not_started_state(exchange: &Exchange) -> Option<ServiceState> {
    match exchange.failure() {
        Some(ProcessingError::Usage(UsageError::NotStarted { state, .. })) => Some(*state),
        _ => None,
    }
}

#[test]
fn work_is_accepted_only_while_started() {
    let managed = ManagedProcessor::new(SetBodyProcessor::new(constant("HELLO")));

    let exchange = deliver(&managed);
    assert_eq!(not_started_state(&exchange), Some(ServiceState::New));
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("hello"));

    assert_eq!(
        managed.start().expect("无状态单元启动成功"),
        StateAdvance::Transition {
            from: ServiceState::New,
            to: ServiceState::Started
        }
    );
    let exchange = deliver(&managed);
    assert!(!exchange.is_failed());
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("HELLO"));

    managed.stop().expect("停止成功");
    let exchange = deliver(&managed);
    assert_eq!(not_started_state(&exchange), Some(ServiceState::Stopped));
}

#[test]
fn restart_after_stop_is_allowed() {
    let managed = ManagedProcessor::new(FailingHooks::default());
    managed.start().expect("启动成功");
    managed.stop().expect("停止成功");
    assert_eq!(
        managed.start().expect("可重新启动"),
        StateAdvance::Transition {
            from: ServiceState::Stopped,
            to: ServiceState::Started
        }
    );
    assert_eq!(managed.inner().starts(), 2);
}

#[test]
fn failed_start_is_absorbing() {
    let managed = ManagedProcessor::new(FailingHooks::failing_start());

    let err = managed.start().expect_err("钩子失败");
    assert!(matches!(err, LifecycleError::StartFailed { ref unit, .. } if unit == "failing-hooks"));
    assert_eq!(managed.state(), ServiceState::Failed);

    assert!(matches!(
        managed.start(),
        Err(LifecycleError::PermanentlyFailed { .. })
    ));
    assert_eq!(
        managed.stop().expect("FAILED 下停止为 Noop"),
        StateAdvance::Noop {
            state: ServiceState::Failed
        }
    );
    assert_eq!(managed.inner().starts(), 1);
    assert_eq!(managed.inner().stops(), 0);

    let exchange = deliver(&managed);
    assert_eq!(not_started_state(&exchange), Some(ServiceState::Failed));
}

#[test]
fn failed_stop_is_absorbing() {
    let managed = ManagedProcessor::new(FailingHooks::failing_stop());
    managed.start().expect("启动成功");

    assert!(matches!(managed.stop(), Err(LifecycleError::StopFailed { .. })));
    assert_eq!(managed.state(), ServiceState::Failed);
    assert!(matches!(
        managed.start(),
        Err(LifecycleError::PermanentlyFailed { .. })
    ));
}

#[test]
fn stop_before_start_keeps_new() {
    let managed = ManagedProcessor::new(FailingHooks::default());
    assert_eq!(
        managed.stop().expect("Noop"),
        StateAdvance::Noop {
            state: ServiceState::New
        }
    );
    assert_eq!(managed.inner().stops(), 0);
}
