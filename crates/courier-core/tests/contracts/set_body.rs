//! SetBody 契约测试
//!
//! # 教案式导航
//! - **核心目标 (Why)**：逐条验证消息体替换单元的端到端行为：写回当前槽位、保留 Header、失败附着且消息不变、
//!   延续恰好调用一次；
//! - **执行策略 (How)**：使用 [`CompletionProbe`] 作为延续，直接调用 `process` 并检查返回值与同步标志；
//! - **契约声明 (What)**：所有场景都必须同步完成（返回 `true` 且标志为 `true`）。

use courier_core::expression::{self, constant};
use courier_core::test_stubs::CompletionProbe;
use courier_core::{
    Attachment, DefaultMessage, EvaluationError, Exchange, Message, Processor, SetBodyProcessor,
};

fn run(processor: &dyn Processor, exchange: Exchange) -> Exchange {
    let probe = CompletionProbe::new();
    let returned = processor.process(exchange, probe.continuation());
    assert!(returned, "SetBody 永不挂起");
    assert_eq!(probe.calls(), 1, "延续必须恰好调用一次");
    let (exchange, completed_sync) = probe.take().expect("应在调用内完成");
    assert!(completed_sync);
    exchange
}

#[test]
fn replaces_input_body_and_keeps_headers() {
    let exchange = Exchange::new(DefaultMessage::new().with_body("hello").with_header("k", "v"));
    let processor = SetBodyProcessor::new(constant("HELLO"));

    let exchange = run(&processor, exchange);

    assert!(!exchange.has_out());
    assert_eq!(exchange.input().body().and_then(|b| b.as_str()), Some("HELLO"));
    assert_eq!(exchange.input().header("k").and_then(|v| v.as_str()), Some("v"));
    assert_eq!(exchange.input().headers().len(), 1);
}

#[test]
fn writes_output_slot_when_present() {
    let mut exchange = Exchange::new(DefaultMessage::new().with_body("hello").with_header("in", "only"));
    exchange.set_output(DefaultMessage::new().with_body("draft").with_header("k", "v"));
    let processor = SetBodyProcessor::new(constant("HELLO"));

    let exchange = run(&processor, exchange);

    assert!(exchange.has_out());
    let output = exchange.output().expect("输出槽位仍存在");
    assert_eq!(output.body().and_then(|b| b.as_str()), Some("HELLO"));
    assert_eq!(output.header("k").and_then(|v| v.as_str()), Some("v"));

    let input = exchange.input();
    assert_eq!(input.body().and_then(|b| b.as_str()), Some("hello"));
    assert_eq!(input.header("in").and_then(|v| v.as_str()), Some("only"));
}

#[test]
fn evaluation_failure_is_attached_and_message_untouched() {
    let exchange = Exchange::new(DefaultMessage::new().with_body("hello").with_header("k", "v"));
    let processor = SetBodyProcessor::new(expression::from_fn("explode()", |_| {
        Err(EvaluationError::failed("explode()", "engine unavailable"))
    }));

    let exchange = run(&processor, exchange);

    let failure = exchange.failure().expect("失败必须附着到交换上");
    assert!(failure.is_evaluation());
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("hello"));
    assert_eq!(exchange.current().header("k").and_then(|v| v.as_str()), Some("v"));
}

#[test]
fn replacement_shares_header_and_attachment_values() {
    let mut original = DefaultMessage::new().with_body("hello").with_header("k", "v");
    original
        .attachments_mut()
        .insert("logo", Attachment::new(vec![1_u8, 2, 3]).with_content_type("image/png"));
    let before_headers = original.headers().clone();

    let exchange = run(&SetBodyProcessor::new(constant(42_i64)), Exchange::new(original));

    let current = exchange.current();
    assert!(current.headers().same_entries(&before_headers));
    let logo = current.attachments().get("logo").expect("附件应被保留");
    assert_eq!(logo.content_type(), Some("image/png"));
    assert_eq!(current.body_as::<i64>(), Some(&42));
}

#[test]
fn header_expression_feeds_body() {
    let exchange = Exchange::new(DefaultMessage::new().with_body("old").with_header("Next", "new"));
    let exchange = run(&SetBodyProcessor::new(expression::header("next")), exchange);
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("new"));
}

#[test]
fn existing_failure_does_not_block_replacement() {
    let mut exchange = Exchange::with_body("hello");
    exchange.set_failure(EvaluationError::failed("upstream", "earlier stage failed"));

    let exchange = run(&SetBodyProcessor::new(constant("HELLO")), exchange);

    assert!(exchange.is_failed(), "处理单元不得隐式清除失败");
    assert_eq!(exchange.current().body().and_then(|b| b.as_str()), Some("HELLO"));
}
