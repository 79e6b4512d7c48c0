use super::{Attachments, HeaderCase, Headers, Message, Value};

/// 默认消息实现：不附加任何表示层不变量的通用载体。
///
/// 处理单元在替换消息时总是新建 `DefaultMessage` 再 [`copy_from`](Message::copy_from) 旧消息，
/// 以免把特化表示拖入与新消息体不一致的状态。
#[derive(Clone, Debug, Default)]
pub struct DefaultMessage {
    body: Option<Value>,
    headers: Headers,
    attachments: Attachments,
}

impl DefaultMessage {
    /// 创建空消息，Header 大小写不敏感。
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建空消息并指定 Header 大小写策略。
    pub fn with_header_case(case: HeaderCase) -> Self {
        Self {
            body: None,
            headers: Headers::new(case),
            attachments: Attachments::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Message for DefaultMessage {
    fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }
}
