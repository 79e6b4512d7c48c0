//! Message 子系统：在途交换中单一方向载荷（消息体 + Header + 附件）的数据模型。
//!
//! # 结构概览
//! - [`Value`]：类型擦除、共享引用的载荷值；
//! - [`Headers`] / [`Attachments`]：扁平元数据映射，克隆即浅拷贝；
//! - [`Message`]：能力接口，路由核心只依赖它；
//! - [`DefaultMessage`]：唯一的默认实现，替换消息时总是回落到它。
//!
//! # 设计约束
//! - 消息的身份与它所在的槽位（输入/输出）无关；
//! - 复制消息只复制元数据，绝不深拷贝未知类型的消息体。

mod attachment;
mod default;
mod headers;
mod value;

use std::any::Any;
use std::fmt;

pub use attachment::{Attachment, Attachments};
pub use default::DefaultMessage;
pub use headers::{HeaderCase, Headers};
pub use value::Value;

/// 消息能力接口。
///
/// # 设计背景（Why）
/// - 传输适配层可能提供携带特殊不变量的消息表示（例如绑定了原始帧的消息），核心只通过本接口读写，
///   替换消息时不假设任何特化表示能够存活；
/// - 特化实现只在确有收益的地方覆写默认方法。
///
/// # 契约说明（What）
/// - 消息体读写不做任何类型校验，读永不失败，写永不失败；
/// - [`Message::copy_from`] 以捐赠方的 Header 与附件（浅拷贝）替换接收方的元数据，消息体保持不变，
///   且只修改接收方。
pub trait Message: Send + Sync + fmt::Debug {
    /// 当前消息体，未设置时为 `None`。
    fn body(&self) -> Option<&Value>;

    /// 替换消息体。
    fn set_body(&mut self, body: Value);

    /// 取走消息体，留下空体。
    fn take_body(&mut self) -> Option<Value>;

    fn headers(&self) -> &Headers;

    fn headers_mut(&mut self) -> &mut Headers;

    fn attachments(&self) -> &Attachments;

    fn attachments_mut(&mut self) -> &mut Attachments;

    /// 采纳捐赠方的元数据，消息体不受影响。
    fn copy_from(&mut self, other: &dyn Message) {
        *self.headers_mut() = other.headers().clone();
        *self.attachments_mut() = other.attachments().clone();
    }

    fn header(&self, name: &str) -> Option<&Value> {
        self.headers().get(name)
    }

    fn set_header(&mut self, name: &str, value: Value) -> Option<Value> {
        self.headers_mut().insert(name, value)
    }

    fn remove_header(&mut self, name: &str) -> Option<Value> {
        self.headers_mut().remove(name)
    }
}

impl<'a> dyn Message + 'a {
    /// 以 `T` 借用消息体；消息体缺失或类型不符时返回 `None`。
    pub fn body_as<T: Any>(&self) -> Option<&T> {
        self.body().and_then(Value::downcast_ref::<T>)
    }
}
