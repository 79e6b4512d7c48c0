//! 面向第三方实现的可复用契约检查。
//!
//! 每个函数在违约时 panic 并给出中文说明，可直接放进调用方自己的 `#[test]` 中：
//!
//! ```
//! use courier_contract_tests::verify;
//! use courier_core::SetBodyProcessor;
//! use courier_core::expression::constant;
//!
//! let exchange = verify::verify_completes_exactly_once(
//!     &SetBodyProcessor::new(constant("HELLO")),
//!     courier_core::Exchange::with_body("hello"),
//! );
//! assert!(!exchange.is_failed());
//! ```

use std::time::Duration;

use courier_core::test_stubs::CompletionProbe;
use courier_core::{
    DefaultMessage, Exchange, ManagedProcessor, Message, ProcessingError, Processor, ServiceState,
    UsageError, Value,
};

/// 等待异步完成的上限。
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(5);

/// 调用处理单元并检查完成信号：延续恰好一次，返回值与同步标志一致。
///
/// 返回交回的 Exchange，供调用方继续断言。
pub fn verify_completes_exactly_once(processor: &dyn Processor, exchange: Exchange) -> Exchange {
    let probe = CompletionProbe::new();
    let label = processor.trace_label().into_owned();
    let returned = processor.process(exchange, probe.continuation());

    let (exchange, completed_sync) = if returned {
        probe
            .take()
            .unwrap_or_else(|| panic!("`{label}` 返回 true，但返回前没有调用延续"))
    } else {
        probe
            .wait(COMPLETION_TIMEOUT)
            .unwrap_or_else(|| panic!("`{label}` 返回 false 后在超时内没有调用延续"))
    };

    assert_eq!(
        completed_sync, returned,
        "`{label}` 的返回值与延续收到的同步标志不一致"
    );
    assert_eq!(probe.calls(), 1, "`{label}` 的延续必须恰好调用一次");
    exchange
}

/// 检查失败被附着到交换上、且当前消息体保持调用前的值。
///
/// 调用方需传入一个必然失败的处理单元。
pub fn verify_failure_is_captured(processor: &dyn Processor, exchange: Exchange) -> ProcessingError {
    let before = exchange.current().body().cloned();
    let mut exchange = verify_completes_exactly_once(processor, exchange);

    let after = exchange.current().body().cloned();
    let unchanged = match (&before, &after) {
        (Some(before), Some(after)) => before.ptr_eq(after),
        (None, None) => true,
        _ => false,
    };
    assert!(unchanged, "失败时当前消息体必须保持不变");
    exchange.clear_failure().expect("失败必须附着到交换上")
}

/// 检查消息实现的 `copy_from`：采纳捐赠方 Header 与附件、消息体不变、捐赠方不被修改。
pub fn verify_copy_from<M>(mut receiver: M)
where
    M: Message,
{
    let donor = DefaultMessage::new()
        .with_body("donor body")
        .with_header("k", "v")
        .with_header("trace", 7_i64);
    let body = Value::from("receiver body");
    receiver.set_body(body.clone());
    receiver.set_header("stale", Value::from(true));

    receiver.copy_from(&donor);

    assert!(
        receiver.body().is_some_and(|current| current.ptr_eq(&body)),
        "copy_from 不得修改接收方消息体"
    );
    assert!(
        receiver.headers().same_entries(donor.headers()),
        "copy_from 后 Header 必须与捐赠方一致（共享值）"
    );
    assert!(receiver.header("stale").is_none(), "接收方原有 Header 必须被替换");
    assert_eq!(donor.headers().len(), 2, "捐赠方不得被修改");
    assert_eq!(
        donor.body().and_then(|b| b.as_str()),
        Some("donor body"),
        "捐赠方不得被修改"
    );
}

/// 检查受管处理单元只在 `STARTED` 期间接收工作。
pub fn verify_rejects_work_outside_started<P>(processor: P)
where
    P: Processor,
{
    let managed = ManagedProcessor::new(processor);
    let exchange = verify_completes_exactly_once(&managed, Exchange::with_body("probe"));
    assert!(
        matches!(
            exchange.failure(),
            Some(ProcessingError::Usage(UsageError::NotStarted {
                state: ServiceState::New,
                ..
            }))
        ),
        "NEW 状态下的调用必须被识别为误用"
    );

    managed.start().expect("启动钩子不应失败");
    let exchange = verify_completes_exactly_once(&managed, Exchange::with_body("probe"));
    assert!(
        !matches!(exchange.failure(), Some(ProcessingError::Usage(_))),
        "STARTED 状态下不应报告误用"
    );

    managed.stop().expect("停止钩子不应失败");
    let exchange = verify_completes_exactly_once(&managed, Exchange::with_body("probe"));
    assert!(
        exchange.failure().is_some_and(ProcessingError::is_usage),
        "STOPPED 状态下的调用必须被识别为误用"
    );
}

/// 对一个处理单元工厂运行全部单元级检查：完成信号与受管误用检测。
///
/// 每项检查使用工厂新建的实例，`#[courier_tck(processor = ...)]` 展开后即调用本函数。
pub fn verify_processor<P, F>(factory: F)
where
    P: Processor,
    F: Fn() -> P,
{
    let exchange = Exchange::new(
        DefaultMessage::new()
            .with_body("tck")
            .with_header("courier.tck", true),
    );
    let exchange = verify_completes_exactly_once(&factory(), exchange);
    assert!(
        !exchange.failure().is_some_and(ProcessingError::is_usage),
        "未受管的处理单元不应报告契约误用"
    );
    verify_rejects_work_outside_started(factory());
}
