use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

/// 二进制附件：可选的内容类型加上一段共享字节。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    content_type: Option<Arc<str>>,
    data: Bytes,
}

impl Attachment {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<Arc<str>>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// 附件字节；克隆 [`Bytes`] 只增加引用计数。
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// 附件名称到 [`Attachment`] 的映射，`clone` 与 Header 一样是浅拷贝。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attachments {
    entries: HashMap<String, Attachment>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Attachment> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, attachment: Attachment) -> Option<Attachment> {
        self.entries.insert(name.into(), attachment)
    }

    pub fn remove(&mut self, name: &str) -> Option<Attachment> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
