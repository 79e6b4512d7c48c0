//! 表达式求值边界。
//!
//! 表达式语言本身不属于本 crate：这里只定义“对交换求值得到一个值”的能力接口，以及几种
//! 测试与简单路由常用的内建实现。类型期望统一在 [`evaluate_as`] 处显式强转，核心内部不做隐式转换。

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt;

use crate::error::EvaluationError;
use crate::exchange::Exchange;
use crate::message::{Message, Value};

/// 对交换求值的外部计算。
///
/// # 契约说明（What）
/// - `evaluate` 只读交换，可能失败；失败以 [`EvaluationError`] 返回，由调用方附着到交换上；
/// - `Display` 输出表达式的简短描述，会出现在处理单元的追踪标签与错误信息中。
pub trait Expression: fmt::Display + Send + Sync {
    fn evaluate(&self, exchange: &Exchange) -> Result<Value, EvaluationError>;
}

impl<E> Expression for Box<E>
where
    E: Expression + ?Sized,
{
    fn evaluate(&self, exchange: &Exchange) -> Result<Value, EvaluationError> {
        (**self).evaluate(exchange)
    }
}

impl<E> Expression for std::sync::Arc<E>
where
    E: Expression + ?Sized,
{
    fn evaluate(&self, exchange: &Exchange) -> Result<Value, EvaluationError> {
        (**self).evaluate(exchange)
    }
}

/// 求值并强转为 `T`；类型不符时返回 [`EvaluationError::TypeMismatch`]。
pub fn evaluate_as<T>(expression: &dyn Expression, exchange: &Exchange) -> Result<T, EvaluationError>
where
    T: Any + Clone,
{
    let value = expression.evaluate(exchange)?;
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| EvaluationError::TypeMismatch {
            expression: expression.to_string(),
            expected: type_name::<T>(),
            actual: value.type_name(),
        })
}

/// 常量表达式。
#[derive(Debug, Clone)]
pub struct Constant {
    value: Value,
}

pub fn constant(value: impl Into<Value>) -> Constant {
    Constant {
        value: value.into(),
    }
}

impl Expression for Constant {
    fn evaluate(&self, _exchange: &Exchange) -> Result<Value, EvaluationError> {
        Ok(self.value.clone())
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_str() {
            Some(text) => write!(f, "constant({text})"),
            None => write!(f, "constant(<{}>)", self.value.type_name()),
        }
    }
}

/// 读取当前消息的某个 Header。
#[derive(Debug, Clone)]
pub struct HeaderExpression {
    name: Cow<'static, str>,
}

pub fn header(name: impl Into<Cow<'static, str>>) -> HeaderExpression {
    HeaderExpression { name: name.into() }
}

impl Expression for HeaderExpression {
    fn evaluate(&self, exchange: &Exchange) -> Result<Value, EvaluationError> {
        exchange
            .current()
            .header(&self.name)
            .cloned()
            .ok_or_else(|| EvaluationError::MissingHeader {
                expression: self.to_string(),
                name: self.name.to_string(),
            })
    }
}

impl fmt::Display for HeaderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "header({})", self.name)
    }
}

/// 读取当前消息体。
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyExpression;

pub fn body() -> BodyExpression {
    BodyExpression
}

impl Expression for BodyExpression {
    fn evaluate(&self, exchange: &Exchange) -> Result<Value, EvaluationError> {
        exchange
            .current()
            .body()
            .cloned()
            .ok_or_else(|| EvaluationError::failed(self.to_string(), "current message has no body"))
    }
}

impl fmt::Display for BodyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("body")
    }
}

/// 带标签的闭包表达式，用于接入外部求值引擎。
pub struct FnExpression<F> {
    label: Cow<'static, str>,
    f: F,
}

pub fn from_fn<F>(label: impl Into<Cow<'static, str>>, f: F) -> FnExpression<F>
where
    F: Fn(&Exchange) -> Result<Value, EvaluationError> + Send + Sync,
{
    FnExpression {
        label: label.into(),
        f,
    }
}

impl<F> Expression for FnExpression<F>
where
    F: Fn(&Exchange) -> Result<Value, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, exchange: &Exchange) -> Result<Value, EvaluationError> {
        (self.f)(exchange)
    }
}

impl<F> fmt::Display for FnExpression<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<F> fmt::Debug for FnExpression<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExpression")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
