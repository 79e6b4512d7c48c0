use crate::case::{TckCase, TckSuite};
use crate::support::{current_text, sample_exchange};
use courier_core::{DefaultMessage, EvaluationError, Exchange, ExchangeId, Message, ProcessingError};

const CASES: &[TckCase] = &[
    TckCase {
        name: "set_out_switches_current_slot",
        test: set_out_switches_current_slot,
    },
    TckCase {
        name: "set_in_leaves_output_untouched",
        test: set_in_leaves_output_untouched,
    },
    TckCase {
        name: "failure_is_last_write_wins",
        test: failure_is_last_write_wins,
    },
    TckCase {
        name: "exchange_ids_are_unique",
        test: exchange_ids_are_unique,
    },
];

const SUITE: TckSuite = TckSuite {
    name: "exchange",
    cases: CASES,
};

/// 返回“交换”主题的测试套件。
pub const fn suite() -> &'static TckSuite {
    &SUITE
}

fn set_out_switches_current_slot() {
    let mut exchange = sample_exchange();
    assert!(!exchange.has_out());
    assert!(exchange.output().is_none());
    assert!(!exchange.has_out(), "读取不得改变 has_out");

    exchange.set_output(DefaultMessage::new().with_body("reply"));

    assert!(exchange.has_out());
    assert_eq!(
        exchange.output().and_then(|m| m.body()).and_then(|b| b.as_str()),
        Some("reply")
    );
    assert_eq!(current_text(&exchange).as_deref(), Some("reply"));
    assert_eq!(
        exchange.input().body().and_then(|b| b.as_str()),
        Some("hello"),
        "设置输出不得影响输入"
    );
    assert!(exchange.input().header("k").is_some());
}

fn set_in_leaves_output_untouched() {
    let mut exchange = sample_exchange();
    exchange.set_output(DefaultMessage::new().with_body("reply"));
    exchange.set_input(DefaultMessage::new().with_body("replaced"));

    assert!(exchange.has_out());
    assert_eq!(current_text(&exchange).as_deref(), Some("reply"));
    assert_eq!(
        exchange.input().body().and_then(|b| b.as_str()),
        Some("replaced")
    );
}

fn failure_is_last_write_wins() {
    let mut exchange = sample_exchange();
    assert!(exchange.set_failure(EvaluationError::failed("first", "a")).is_none());
    let previous = exchange
        .set_failure(ProcessingError::processor("audit", "disk full"))
        .expect("应返回被覆盖的失败");
    assert!(previous.is_evaluation());

    let current = exchange.failure().expect("失败存在");
    assert!(matches!(current, ProcessingError::Processor { processor, .. } if processor == "audit"));

    assert!(exchange.clear_failure().is_some());
    assert!(!exchange.is_failed());
}

fn exchange_ids_are_unique() {
    let ids: Vec<ExchangeId> = (0..64).map(|_| Exchange::with_body(1_i64).id().clone()).collect();
    let mut sorted: Vec<_> = ids.iter().map(ExchangeId::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());

    let custom = ExchangeId::parse("order-42").expect("非空标识合法");
    let exchange = Exchange::with_body("x").with_id(custom.clone());
    assert_eq!(exchange.id(), &custom);
    assert!(ExchangeId::parse("   ").is_none());
}
