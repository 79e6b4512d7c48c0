use std::fmt::Write;
use std::panic;

use courier_core::{DefaultMessage, Exchange};

/// 在附加上下文的情况下重新抛出 panic。
///
/// # 契约（What）
/// - 调用前必须处于 `catch_unwind` 的错误分支中；
/// - 函数不会正常返回，payload 被格式化为 `[courier-tck::<suite>::<case>] 测试失败：<原始信息>`。
pub fn panic_with_context(suite: &str, case: &str, payload: Box<dyn std::any::Any + Send>) -> ! {
    let mut message = String::new();
    let _ = write!(&mut message, "[courier-tck::{suite}::{case}] 测试失败：");

    if let Some(text) = payload.downcast_ref::<&str>() {
        let _ = write!(&mut message, "{text}");
    } else if let Some(text) = payload.downcast_ref::<String>() {
        let _ = write!(&mut message, "{text}");
    } else {
        let _ = write!(&mut message, "<未知 panic 类型>");
    }

    panic::resume_unwind(Box::new(message));
}

/// 携带 `hello` 消息体与 `k: v` Header 的样例交换。
pub fn sample_exchange() -> Exchange {
    Exchange::new(DefaultMessage::new().with_body("hello").with_header("k", "v"))
}

/// 读取当前消息体的文本表示。
pub fn current_text(exchange: &Exchange) -> Option<String> {
    exchange
        .current()
        .body()
        .and_then(|body| body.as_str())
        .map(str::to_owned)
}
