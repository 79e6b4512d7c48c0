use std::borrow::Cow;
use std::fmt;

use crate::exchange::Exchange;
use crate::expression::Expression;
use crate::message::Message;
use crate::lifecycle::Lifecycle;
use crate::processor::{Continuation, Processor};

/// 以表达式结果设置当前消息 Header 的处理单元。
///
/// 与 [`SetBodyProcessor`](super::SetBodyProcessor) 不同，这里原地修改当前消息：Header 是通用元数据，
/// 不会破坏特化消息表示的不变量。求值失败时当前消息保持不变。
pub struct SetHeaderProcessor<E> {
    name: Cow<'static, str>,
    expression: E,
}

impl<E> SetHeaderProcessor<E>
where
    E: Expression,
{
    pub fn new(name: impl Into<Cow<'static, str>>, expression: E) -> Self {
        Self {
            name: name.into(),
            expression,
        }
    }

    pub fn header_name(&self) -> &str {
        &self.name
    }
}

impl<E> Lifecycle for SetHeaderProcessor<E> {}

impl<E> Processor for SetHeaderProcessor<E>
where
    E: Expression,
{
    fn process(&self, mut exchange: Exchange, done: Continuation) -> bool {
        match self.expression.evaluate(&exchange) {
            Ok(value) => {
                exchange.current_mut().set_header(&self.name, value);
            }
            Err(err) => {
                tracing::debug!(
                    exchange.id = %exchange.id(),
                    header = %self.name,
                    error = %err,
                    "setHeader evaluation failed"
                );
                exchange.set_failure(err);
            }
        }

        done.done(exchange, true);
        true
    }

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("setHeader[{}, {}]", self.name, self.expression))
    }
}

impl<E> fmt::Display for SetHeaderProcessor<E>
where
    E: Expression,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetHeader({}, {})", self.name, self.expression)
    }
}

impl<E> fmt::Debug for SetHeaderProcessor<E>
where
    E: Expression,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetHeaderProcessor")
            .field("name", &self.name)
            .field("expression", &self.expression.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::process_blocking;
    use crate::expression::{body, header};

    #[test]
    fn copies_body_into_header() {
        let processor = SetHeaderProcessor::new("echo", body());
        assert_eq!(processor.trace_label(), "setHeader[echo, body]");

        let exchange = process_blocking(&processor, Exchange::with_body("payload")).expect("应完成");
        let echoed = exchange.current().header("echo").and_then(|v| v.as_str().map(str::to_owned));
        assert_eq!(echoed.as_deref(), Some("payload"));
    }

    #[test]
    fn missing_source_header_fails_without_mutation() {
        let processor = SetHeaderProcessor::new("copy", header("absent"));
        let exchange = process_blocking(&processor, Exchange::with_body("payload")).expect("应完成");
        assert!(exchange.is_failed());
        assert!(exchange.current().headers().is_empty());
    }
}
