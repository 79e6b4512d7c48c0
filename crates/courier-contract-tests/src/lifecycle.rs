use crate::case::{TckCase, TckSuite};
use crate::verify::verify_rejects_work_outside_started;
use courier_core::expression::constant;
use courier_core::test_stubs::FailingHooks;
use courier_core::{
    ContractStateMachine, LifecycleError, LifecyclePhase, LifecycleSignal, LifecycleStateMachine,
    ServiceState, ServiceSupport, SetBodyProcessor, StateAdvance,
};

const CASES: &[TckCase] = &[
    TckCase {
        name: "documented_transitions_hold",
        test: documented_transitions_hold,
    },
    TckCase {
        name: "only_started_accepts_work",
        test: only_started_accepts_work,
    },
    TckCase {
        name: "hook_failure_is_absorbing",
        test: hook_failure_is_absorbing,
    },
    TckCase {
        name: "managed_processor_detects_misuse",
        test: managed_processor_detects_misuse,
    },
    TckCase {
        name: "transition_in_progress_is_rejected",
        test: transition_in_progress_is_rejected,
    },
];

const SUITE: TckSuite = TckSuite {
    name: "lifecycle",
    cases: CASES,
};

/// 返回“生命周期”主题的测试套件。
pub const fn suite() -> &'static TckSuite {
    &SUITE
}

fn documented_transitions_hold() {
    use LifecycleSignal as Sig;
    use ServiceState as St;

    let mut machine = LifecycleStateMachine::new();
    let path = [
        (Sig::StartRequested, St::Starting),
        (Sig::StartSucceeded, St::Started),
        (Sig::StopRequested, St::Stopping),
        (Sig::StopSucceeded, St::Stopped),
        (Sig::StartRequested, St::Starting),
        (Sig::StartFailed, St::Failed),
    ];
    for (signal, expected) in path {
        let from = machine.state();
        assert_eq!(
            machine.on_signal(&signal),
            StateAdvance::Transition { from, to: expected },
            "{from:?} 收到 {signal:?} 应进入 {expected:?}"
        );
    }

    for signal in [Sig::StartRequested, Sig::StopRequested, Sig::StartSucceeded] {
        assert_eq!(
            machine.on_signal(&signal),
            StateAdvance::Noop { state: St::Failed },
            "FAILED 为吸收态"
        );
    }
}

fn only_started_accepts_work() {
    for state in [
        ServiceState::New,
        ServiceState::Starting,
        ServiceState::Stopping,
        ServiceState::Stopped,
        ServiceState::Failed,
    ] {
        assert!(!state.accepts_work(), "{state} 不得接收工作");
    }
    assert!(ServiceState::Started.accepts_work());
}

fn hook_failure_is_absorbing() {
    let support = ServiceSupport::new("flaky");
    let hooks = FailingHooks::failing_stop();
    support.start(&hooks).expect("启动成功");

    let err = support.stop(&hooks).expect_err("停止钩子失败");
    assert!(matches!(err, LifecycleError::StopFailed { .. }));
    assert_eq!(support.state(), ServiceState::Failed);
    assert!(matches!(
        support.start(&hooks),
        Err(LifecycleError::PermanentlyFailed { .. })
    ));
    assert_eq!(hooks.starts(), 1);
}

fn managed_processor_detects_misuse() {
    verify_rejects_work_outside_started(SetBodyProcessor::new(constant("HELLO")));
    verify_rejects_work_outside_started(FailingHooks::default());
}

fn transition_in_progress_is_rejected() {
    use courier_core::{BoxError, Lifecycle};
    use std::cell::RefCell;

    struct StopDuringStart<'a> {
        support: &'a ServiceSupport,
        nested: RefCell<Option<Result<StateAdvance<ServiceState>, LifecycleError>>>,
    }

    impl Lifecycle for StopDuringStart<'_> {
        fn do_start(&self) -> Result<(), BoxError> {
            struct Quiet;
            impl Lifecycle for Quiet {}
            *self.nested.borrow_mut() = Some(self.support.stop(&Quiet));
            Ok(())
        }
    }

    let support = ServiceSupport::new("reentrant");
    let hooks = StopDuringStart {
        support: &support,
        nested: RefCell::new(None),
    };
    support.start(&hooks).expect("外层启动成功");

    let nested = hooks.nested.borrow_mut().take().expect("钩子已执行");
    assert!(matches!(
        nested,
        Err(LifecycleError::TransitionInProgress {
            state: ServiceState::Starting,
            requested: LifecyclePhase::Stop,
            ..
        })
    ));
    assert_eq!(support.state(), ServiceState::Started);
}
