use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::case::{TckCase, TckSuite};
use crate::support::{current_text, sample_exchange};
use crate::verify::{verify_completes_exactly_once, verify_failure_is_captured};
use courier_core::expression::{self, constant};
use courier_core::test_stubs::{DeferredProcessor, EventLog, RecordingProcessor};
use courier_core::{
    EvaluationError, Exchange, Expression, Message, Pipeline, Processor, SetBodyProcessor,
    SetHeaderProcessor,
};

const CASES: &[TckCase] = &[
    TckCase {
        name: "sync_unit_completes_inline",
        test: sync_unit_completes_inline,
    },
    TckCase {
        name: "async_unit_reports_false_and_completes_later",
        test: async_unit_reports_false_and_completes_later,
    },
    TckCase {
        name: "evaluation_failure_is_captured",
        test: evaluation_failure_is_captured,
    },
    TckCase {
        name: "pipeline_reflects_stage_completion_mode",
        test: pipeline_reflects_stage_completion_mode,
    },
    TckCase {
        name: "failure_travels_through_pipeline",
        test: failure_travels_through_pipeline,
    },
    TckCase {
        name: "processor_is_shareable_across_threads",
        test: processor_is_shareable_across_threads,
    },
];

const SUITE: TckSuite = TckSuite {
    name: "processor",
    cases: CASES,
};

/// 返回“处理单元”主题的测试套件。
pub const fn suite() -> &'static TckSuite {
    &SUITE
}

fn exploding() -> SetBodyProcessor<impl Expression> {
    SetBodyProcessor::new(expression::from_fn("explode()", |_| {
        Err(EvaluationError::failed("explode()", "engine unavailable"))
    }))
}

fn sync_unit_completes_inline() {
    let exchange = verify_completes_exactly_once(
        &SetHeaderProcessor::new("seen", constant(true)),
        sample_exchange(),
    );
    assert!(exchange.current().header("seen").is_some());
    assert_eq!(current_text(&exchange).as_deref(), Some("hello"));
}

fn async_unit_reports_false_and_completes_later() {
    let deferred = DeferredProcessor::new(SetBodyProcessor::new(constant("HELLO")))
        .with_delay(Duration::from_millis(5));
    let exchange = verify_completes_exactly_once(&deferred, sample_exchange());
    assert_eq!(current_text(&exchange).as_deref(), Some("HELLO"));
    assert!(exchange.current().header("k").is_some());
}

fn evaluation_failure_is_captured() {
    let failure = verify_failure_is_captured(&exploding(), sample_exchange());
    assert!(failure.is_evaluation());

    let deferred = DeferredProcessor::new(exploding());
    assert!(verify_failure_is_captured(&deferred, sample_exchange()).is_evaluation());
}

fn pipeline_reflects_stage_completion_mode() {
    let sync = Pipeline::builder()
        .stage(SetBodyProcessor::new(constant("a")))
        .stage(SetBodyProcessor::new(constant("b")))
        .build();
    let exchange = verify_completes_exactly_once(&sync, sample_exchange());
    assert_eq!(current_text(&exchange).as_deref(), Some("b"));

    let mixed = Pipeline::builder()
        .stage(SetBodyProcessor::new(constant("a")))
        .stage(DeferredProcessor::new(SetBodyProcessor::new(constant("b"))))
        .stage(SetHeaderProcessor::new("final", expression::body()))
        .build();
    let exchange = verify_completes_exactly_once(&mixed, sample_exchange());
    assert_eq!(
        exchange.current().header("final").and_then(|v| v.as_str()),
        Some("b")
    );
}

fn failure_travels_through_pipeline() {
    let log = EventLog::new();
    let pipeline = Pipeline::builder()
        .stage(exploding())
        .stage(RecordingProcessor::new("downstream", log.clone()))
        .build();

    let exchange = verify_completes_exactly_once(&pipeline, sample_exchange());
    assert!(exchange.failure().is_some_and(|f| f.is_evaluation()));
    assert_eq!(log.events(), ["process:downstream"], "失败后下游阶段仍需执行");
    assert_eq!(current_text(&exchange).as_deref(), Some("hello"));
}

fn processor_is_shareable_across_threads() {
    let processor: Arc<dyn Processor> =
        Arc::new(SetHeaderProcessor::new("copy", expression::body()));
    let results = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let processor = Arc::clone(&processor);
            let results = Arc::clone(&results);
            thread::spawn(move || {
                let exchange = verify_completes_exactly_once(
                    processor.as_ref(),
                    Exchange::with_body(format!("worker-{worker}")),
                );
                let copied = exchange
                    .current()
                    .header("copy")
                    .and_then(|v| v.as_str())
                    .map(str::to_owned);
                results.lock().push((worker, copied));
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("工作线程不应 panic");
    }

    let mut results = results.lock().clone();
    results.sort();
    for (worker, copied) in results {
        assert_eq!(copied, Some(format!("worker-{worker}")), "交换之间不得串扰");
    }
}
