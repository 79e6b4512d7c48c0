use std::borrow::Cow;

use crate::case::{TckCase, TckSuite};
use crate::support::{current_text, sample_exchange};
use crate::verify::{verify_completes_exactly_once, verify_failure_is_captured};
use courier_core::expression::constant;
use courier_core::test_stubs::DeferredProcessor;
use courier_core::{
    Continuation, EvaluationError, Exchange, Lifecycle, Message, ProcessingError, Processor,
    SetBodyProcessor, UsageError, process_async, process_blocking, processor_fn,
};

const CASES: &[TckCase] = &[
    TckCase {
        name: "sync_processor_completes_inline",
        test: sync_processor_completes_inline,
    },
    TckCase {
        name: "sync_processor_error_is_captured",
        test: sync_processor_error_is_captured,
    },
    TckCase {
        name: "future_bridge_reports_completion_mode",
        test: future_bridge_reports_completion_mode,
    },
    TckCase {
        name: "dropped_continuation_is_reported",
        test: dropped_continuation_is_reported,
    },
];

const SUITE: TckSuite = TckSuite {
    name: "adapter",
    cases: CASES,
};

/// 返回“适配器”主题的测试套件。
pub const fn suite() -> &'static TckSuite {
    &SUITE
}

fn sync_processor_completes_inline() {
    let upper = processor_fn("upper", |exchange: &mut Exchange| {
        let text = exchange
            .current()
            .body()
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_uppercase();
        exchange.current_mut().set_body(text.into());
        Ok(())
    });

    let exchange = verify_completes_exactly_once(&upper, sample_exchange());
    assert_eq!(current_text(&exchange).as_deref(), Some("HELLO"));
    assert!(exchange.current().header("k").is_some());
}

fn sync_processor_error_is_captured() {
    let failing = processor_fn("failing", |_: &mut Exchange| {
        Err(ProcessingError::from(EvaluationError::failed("lookup()", "miss")))
    });
    assert!(verify_failure_is_captured(&failing, sample_exchange()).is_evaluation());
}

fn future_bridge_reports_completion_mode() {
    let inline = SetBodyProcessor::new(constant("HELLO"));
    assert!(process_async(&inline, sample_exchange()).completed_sync());

    let deferred = DeferredProcessor::new(SetBodyProcessor::new(constant("LATER")));
    assert!(!process_async(&deferred, sample_exchange()).completed_sync());

    let exchange = process_blocking(&deferred, sample_exchange()).expect("延续必被调用");
    assert_eq!(current_text(&exchange).as_deref(), Some("LATER"));
}

fn dropped_continuation_is_reported() {
    struct Forgetful;

    impl Lifecycle for Forgetful {}

    impl Processor for Forgetful {
        fn process(&self, _exchange: Exchange, done: Continuation) -> bool {
            drop(done);
            false
        }

        fn trace_label(&self) -> Cow<'_, str> {
            Cow::Borrowed("forgetful")
        }
    }

    match process_blocking(&Forgetful, sample_exchange()) {
        Err(UsageError::ContinuationDropped { unit }) => assert_eq!(unit, "forgetful"),
        other => panic!("丢弃延续必须被报告，实际得到 {other:?}"),
    }
}
