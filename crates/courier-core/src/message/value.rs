use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// 类型擦除的载荷值，用于消息体、Header 与交换属性。
///
/// # 设计背景（Why）
/// - 路由引擎不理解业务载荷的具体类型，消息体必须能承载任意值；
/// - 复制消息时只复制共享引用，绝不对未知类型做深拷贝，因此内部以 [`Arc`] 持有。
///
/// # 契约说明（What）
/// - 构造后内容不可变，`clone` 只增加引用计数；
/// - 只在显式的强转点读取具体类型：[`Value::downcast_ref`]、[`Value::is`]、[`Value::as_str`]；
///   核心代码内部不做任何隐式转换，类型期望由表达式边界负责（见 [`evaluate_as`](crate::evaluate_as)）。
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// 包装任意 `Send + Sync + 'static` 值。
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// 构造时记录的具体类型名，仅用于诊断。
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 判断内部值是否为 `T`。
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// 以 `T` 借用内部值，类型不符时返回 `None`。
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// 文本强转点：接受 `String` 与 `&'static str` 两种表示。
    pub fn as_str(&self) -> Option<&str> {
        if let Some(text) = self.inner.downcast_ref::<String>() {
            return Some(text.as_str());
        }
        self.inner.downcast_ref::<&'static str>().copied()
    }

    /// 两个值是否共享同一份底层分配。
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => write!(f, "Value({text:?})"),
            None => write!(f, "Value(<{}>)", self.type_name),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::new(value)
                }
            }
        )*
    };
}

impl_from_for_value!(
    String,
    &'static str,
    bool,
    i32,
    i64,
    u32,
    u64,
    f64,
    Bytes,
    Vec<u8>,
);
