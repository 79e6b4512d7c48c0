//! Pipeline 组合契约测试
//!
//! - **核心目标 (Why)**：组合单元必须把子阶段的同步/异步完成如实地反映到自身返回值与延续标志上，
//!   失败随交换流动而不是中止遍历，生命周期按顺序启动、逆序停止并在失败时回滚；
//! - **执行策略 (How)**：以 [`DeferredProcessor`] 模拟在其它线程完成的阶段，以 [`RecordingProcessor`]
//!   记录阶段的处理与钩子顺序。

use std::sync::Arc;
use std::time::Duration;

use courier_core::expression::{self, constant};
use courier_core::test_stubs::{CompletionProbe, DeferredProcessor, EventLog, RecordingProcessor};
use courier_core::{
    EvaluationError, Exchange, Lifecycle, LifecycleError, ManagedProcessor, Message, Pipeline,
    Processor, ServiceState, SetBodyProcessor, SetHeaderProcessor, process_blocking,
};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn deferred_stage_makes_pipeline_async() {
    let pipeline = Pipeline::builder()
        .stage(SetBodyProcessor::new(constant("first")))
        .stage(
            DeferredProcessor::new(SetHeaderProcessor::new("seen", expression::body()))
                .with_delay(Duration::from_millis(10)),
        )
        .stage(SetBodyProcessor::new(constant("last")))
        .build();
    let probe = CompletionProbe::new();

    let returned = pipeline.process(Exchange::with_body("input"), probe.continuation());

    assert!(!returned, "存在异步阶段时必须返回 false");
    let (exchange, completed_sync) = probe.wait(WAIT).expect("应在超时前完成");
    assert!(!completed_sync);
    assert_eq!(probe.calls(), 1);
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("last"));
    assert_eq!(exchange.current().header("seen").and_then(|v| v.as_str()), Some("first"));
}

#[test]
fn blocking_call_waits_for_async_completion() {
    let pipeline = Pipeline::builder()
        .stage(DeferredProcessor::new(SetBodyProcessor::new(constant("done"))))
        .build();

    let exchange = process_blocking(&pipeline, Exchange::with_body("input")).expect("延续必被调用");
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("done"));
}

#[test]
fn failure_travels_with_the_exchange() {
    let log = EventLog::new();
    let pipeline = Pipeline::builder()
        .stage(SetBodyProcessor::new(expression::from_fn("explode()", |_| {
            Err(EvaluationError::failed("explode()", "engine unavailable"))
        })))
        .stage(RecordingProcessor::new("after", log.clone()))
        .stage(SetBodyProcessor::new(constant("recovered body")))
        .build();
    let probe = CompletionProbe::new();

    assert!(pipeline.process(Exchange::with_body("input"), probe.continuation()));

    let (exchange, completed_sync) = probe.take().expect("应同步完成");
    assert!(completed_sync);
    assert_eq!(log.events(), ["process:after"]);
    assert!(exchange.failure().is_some_and(|f| f.is_evaluation()));
    assert_eq!(
        exchange.current().body().and_then(|b| b.as_str()),
        Some("recovered body")
    );
}

#[test]
fn start_rolls_back_on_failure() {
    let log = EventLog::new();
    let pipeline = Pipeline::builder()
        .stage(RecordingProcessor::new("a", log.clone()))
        .stage(RecordingProcessor::new("b", log.clone()).with_failing_start())
        .stage(RecordingProcessor::new("c", log.clone()))
        .build();
    let managed = ManagedProcessor::new(pipeline);

    let err = managed.start().expect_err("第二个阶段启动失败");
    assert!(matches!(err, LifecycleError::StartFailed { .. }));
    assert_eq!(managed.state(), ServiceState::Failed);
    assert_eq!(log.events(), ["start:a", "start:b", "stop:a"]);
}

#[test]
fn stop_runs_in_reverse_order() {
    let log = EventLog::new();
    let pipeline = Pipeline::builder()
        .stage(RecordingProcessor::new("a", log.clone()))
        .stage(RecordingProcessor::new("b", log.clone()))
        .build();

    pipeline.do_start().expect("启动成功");
    pipeline.do_stop().expect("停止成功");

    assert_eq!(log.events(), ["start:a", "start:b", "stop:b", "stop:a"]);
}

#[test]
fn managed_stages_follow_pipeline_lifecycle() {
    let stage = Arc::new(ManagedProcessor::new(SetBodyProcessor::new(constant("x"))));
    let pipeline = ManagedProcessor::new(Pipeline::new([stage.clone() as Arc<dyn Processor>]));

    pipeline.start().expect("启动成功");
    assert_eq!(stage.state(), ServiceState::Started);

    pipeline.stop().expect("停止成功");
    assert_eq!(stage.state(), ServiceState::Stopped);
}

fn counting_stages(count: usize) -> Vec<Arc<dyn Processor>> {
    (0..count)
        .map(|_| {
            Arc::new(SetHeaderProcessor::new("n", constant(1_i64))) as Arc<dyn Processor>
        })
        .collect()
}

#[test]
fn long_synchronous_chain_runs_in_constant_stack() {
    let pipeline = Pipeline::new(counting_stages(10_000));
    let probe = CompletionProbe::new();

    assert!(pipeline.process(Exchange::with_body("x"), probe.continuation()));

    let (exchange, completed_sync) = probe.take().expect("应同步完成");
    assert!(completed_sync);
    assert_eq!(probe.calls(), 1);
    assert_eq!(exchange.current().header("n").and_then(|v| v.downcast_ref::<i64>()), Some(&1));
    assert!(!exchange.is_failed());
}

#[test]
fn long_chain_resumes_after_deferred_stage() {
    let mut stages = counting_stages(5_000);
    stages.push(Arc::new(
        DeferredProcessor::new(SetBodyProcessor::new(constant("midway")))
            .with_delay(Duration::from_millis(10)),
    ));
    stages.extend(counting_stages(5_000));
    stages.push(Arc::new(SetHeaderProcessor::new("final", expression::body())));
    let pipeline = Pipeline::new(stages);
    let probe = CompletionProbe::new();

    assert!(!pipeline.process(Exchange::with_body("x"), probe.continuation()));

    let (exchange, completed_sync) = probe.wait(WAIT).expect("应在超时前完成");
    assert!(!completed_sync);
    assert_eq!(probe.calls(), 1);
    assert_eq!(exchange.current().header("final").and_then(|v| v.as_str()), Some("midway"));
}
