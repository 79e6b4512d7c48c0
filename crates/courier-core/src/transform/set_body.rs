use std::borrow::Cow;
use std::fmt;

use crate::exchange::Exchange;
use crate::expression::Expression;
use crate::lifecycle::Lifecycle;
use crate::message::{DefaultMessage, Message};
use crate::processor::{Continuation, Processor};

/// 以表达式结果替换当前消息体的处理单元。
///
/// # 行为描述（How）
/// 1. 对交换求值得到新消息体；
/// 2. 依据 [`Exchange::has_out`] 确定当前槽位；
/// 3. 新建 [`DefaultMessage`]，先 [`copy_from`](Message::copy_from) 旧消息保留 Header 与附件，再写入新消息体；
/// 4. 写回当前槽位，另一个槽位不受影响；
/// 5. 求值失败时跳过 2-4，把错误附着到交换上；
/// 6. 无论成败都以“同步完成”调用延续并返回 `true`。
///
/// 新建消息而不是原地修改，是为了不把特化消息表示带入与新消息体不一致的状态。
pub struct SetBodyProcessor<E> {
    expression: E,
}

impl<E> SetBodyProcessor<E>
where
    E: Expression,
{
    pub fn new(expression: E) -> Self {
        Self { expression }
    }

    pub fn expression(&self) -> &E {
        &self.expression
    }
}

impl<E> Lifecycle for SetBodyProcessor<E> {}

impl<E> Processor for SetBodyProcessor<E>
where
    E: Expression,
{
    fn process(&self, mut exchange: Exchange, done: Continuation) -> bool {
        match self.expression.evaluate(&exchange) {
            Ok(body) => {
                let mut message = DefaultMessage::new();
                message.copy_from(exchange.current());
                message.set_body(body);
                if exchange.has_out() {
                    exchange.set_output(message);
                } else {
                    exchange.set_input(message);
                }
            }
            Err(err) => {
                tracing::debug!(
                    exchange.id = %exchange.id(),
                    expression = %self.expression,
                    error = %err,
                    "setBody evaluation failed"
                );
                exchange.set_failure(err);
            }
        }

        done.done(exchange, true);
        true
    }

    fn trace_label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("setBody[{}]", self.expression))
    }
}

impl<E> fmt::Display for SetBodyProcessor<E>
where
    E: Expression,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetBody({})", self.expression)
    }
}

impl<E> fmt::Debug for SetBodyProcessor<E>
where
    E: Expression,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetBodyProcessor")
            .field("expression", &self.expression.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::constant;

    #[test]
    fn labels_follow_expression() {
        let processor = SetBodyProcessor::new(constant("HELLO"));
        assert_eq!(processor.to_string(), "SetBody(constant(HELLO))");
        assert_eq!(processor.trace_label(), "setBody[constant(HELLO)]");
    }

    #[test]
    fn hooks_are_noops() {
        let processor = SetBodyProcessor::new(constant(1_i64));
        assert!(processor.do_start().is_ok());
        assert!(processor.do_stop().is_ok());
    }
}
