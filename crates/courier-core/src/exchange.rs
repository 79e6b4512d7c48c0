//! Exchange：在途工作单元。
//!
//! # 契约说明（What）
//! - 输入消息自创建起即存在；输出消息仅在某个处理单元决定产生响应/派生消息后出现（has-out 状态）；
//! - 当前槽位由 [`Exchange::has_out`] 决定：一旦设置了输出，后续阶段必须读写输出而非输入；
//! - 设置一个槽位永远不会隐式清空或读取另一个槽位；
//! - 失败至多记录一个，后写覆盖先写，只有显式调用 [`Exchange::clear_failure`] 才会清除。
//!
//! # 所有权（How）
//! - 同一时刻只有一次在途遍历拥有 Exchange：它按值移入 [`Processor::process`](crate::Processor::process)，
//!   再经由 [`Continuation`](crate::Continuation) 移交给下一阶段，不存在跨遍历的别名。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ProcessingError;
use crate::message::{DefaultMessage, Message, Value};

static NEXT_EXCHANGE_SEQ: AtomicU64 = AtomicU64::new(1);

/// 交换标识，在进程内唯一，用于日志关联。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(Arc<str>);

impl ExchangeId {
    /// 生成新的进程内唯一标识。
    pub fn generate() -> Self {
        let seq = NEXT_EXCHANGE_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("ex-{:x}-{seq:08x}", std::process::id()).into())
    }

    /// 使用外部传播的标识；空白字符串返回 `None`。
    pub fn parse(value: impl Into<Arc<str>>) -> Option<Self> {
        let value = value.into();
        (!value.trim().is_empty()).then_some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 消息交换模式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExchangePattern {
    /// 单向投递，不期待响应。
    #[default]
    InOnly,
    /// 请求-响应。
    InOut,
}

/// 在途工作单元：输入消息、可选输出消息与可选失败。
pub struct Exchange {
    id: ExchangeId,
    pattern: ExchangePattern,
    properties: HashMap<String, Value>,
    input: Box<dyn Message>,
    output: Option<Box<dyn Message>>,
    failure: Option<ProcessingError>,
}

impl Exchange {
    /// 以给定输入消息创建交换。
    pub fn new(input: impl Message + 'static) -> Self {
        Self::from_boxed(Box::new(input))
    }

    pub fn from_boxed(input: Box<dyn Message>) -> Self {
        Self {
            id: ExchangeId::generate(),
            pattern: ExchangePattern::default(),
            properties: HashMap::new(),
            input,
            output: None,
            failure: None,
        }
    }

    /// 以 [`DefaultMessage`] 承载消息体创建交换。
    pub fn with_body(body: impl Into<Value>) -> Self {
        Self::new(DefaultMessage::new().with_body(body))
    }

    pub fn with_id(mut self, id: ExchangeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_pattern(mut self, pattern: ExchangePattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn id(&self) -> &ExchangeId {
        &self.id
    }

    pub fn pattern(&self) -> ExchangePattern {
        self.pattern
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.insert(name.into(), value.into())
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    /// 是否曾经设置过输出消息；读取操作不会改变结果。
    pub fn has_out(&self) -> bool {
        self.output.is_some()
    }

    pub fn input(&self) -> &dyn Message {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> &mut dyn Message {
        self.input.as_mut()
    }

    /// 替换输入槽位，不触碰输出槽位。
    pub fn set_input(&mut self, message: impl Message + 'static) {
        self.input = Box::new(message);
    }

    pub fn output(&self) -> Option<&dyn Message> {
        self.output.as_deref()
    }

    pub fn output_mut(&mut self) -> Option<&mut dyn Message> {
        match &mut self.output {
            Some(message) => Some(message.as_mut()),
            None => None,
        }
    }

    /// 替换输出槽位并进入 has-out 状态，不触碰输入槽位。
    pub fn set_output(&mut self, message: impl Message + 'static) {
        self.output = Some(Box::new(message));
    }

    /// 当前槽位的消息：有输出时为输出，否则为输入。
    pub fn current(&self) -> &dyn Message {
        match &self.output {
            Some(message) => message.as_ref(),
            None => self.input.as_ref(),
        }
    }

    pub fn current_mut(&mut self) -> &mut dyn Message {
        match &mut self.output {
            Some(message) => message.as_mut(),
            None => self.input.as_mut(),
        }
    }

    /// 记录处理失败，返回被覆盖的旧失败。
    ///
    /// 多次调用时后写覆盖先写，不保留历史；被覆盖的失败只会出现在 `debug` 日志里。
    pub fn set_failure(&mut self, failure: impl Into<ProcessingError>) -> Option<ProcessingError> {
        let previous = self.failure.replace(failure.into());
        if let Some(overwritten) = &previous {
            tracing::debug!(
                exchange.id = %self.id,
                overwritten = %overwritten,
                "exchange failure overwritten"
            );
        }
        previous
    }

    pub fn failure(&self) -> Option<&ProcessingError> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// 显式清除失败，例如错误处理器已经完成补偿。
    pub fn clear_failure(&mut self) -> Option<ProcessingError> {
        self.failure.take()
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;

    #[test]
    fn set_output_switches_current_slot_only() {
        let mut exchange = Exchange::with_body("request");
        assert!(!exchange.has_out());
        assert_eq!(exchange.current().body().and_then(Value::as_str), Some("request"));

        exchange.set_output(DefaultMessage::new().with_body("response"));

        assert!(exchange.has_out());
        assert_eq!(exchange.input().body().and_then(Value::as_str), Some("request"));
        assert_eq!(
            exchange.output().and_then(|m| m.body()).and_then(Value::as_str),
            Some("response")
        );
        assert_eq!(exchange.current().body().and_then(Value::as_str), Some("response"));
    }

    #[test]
    fn set_input_never_touches_output() {
        let mut exchange = Exchange::with_body("a");
        exchange.set_output(DefaultMessage::new().with_body("b"));
        exchange.set_input(DefaultMessage::new().with_body("c"));
        assert!(exchange.has_out());
        assert_eq!(
            exchange.output().and_then(|m| m.body()).and_then(Value::as_str),
            Some("b")
        );
    }

    #[test]
    fn failure_is_last_write_wins_until_cleared() {
        let mut exchange = Exchange::with_body(1_i64);
        assert!(exchange.set_failure(EvaluationError::failed("first", "x")).is_none());
        let overwritten = exchange
            .set_failure(EvaluationError::failed("second", "y"))
            .expect("第二次写入应返回被覆盖的失败");
        assert!(overwritten.to_string().contains("first"));
        assert!(exchange.failure().is_some_and(|f| f.to_string().contains("second")));

        assert!(exchange.clear_failure().is_some());
        assert!(!exchange.is_failed());
    }

    #[test]
    fn ids_are_unique_and_parse_rejects_blank() {
        let a = ExchangeId::generate();
        let b = ExchangeId::generate();
        assert_ne!(a, b);
        assert!(ExchangeId::parse("  ").is_none());
        let external = ExchangeId::parse("upstream-42").expect("非空标识应被接受");
        let exchange = Exchange::with_body("x").with_id(external.clone());
        assert_eq!(exchange.id(), &external);
    }

    #[test]
    fn properties_are_separate_from_headers() {
        let mut exchange = Exchange::with_body("x").with_pattern(ExchangePattern::InOut);
        exchange.set_property("retries", 3_u32);
        assert_eq!(exchange.pattern(), ExchangePattern::InOut);
        assert_eq!(
            exchange.property("retries").and_then(Value::downcast_ref::<u32>),
            Some(&3)
        );
        assert!(exchange.current().header("retries").is_none());
        assert!(exchange.remove_property("retries").is_some());
    }
}
