use std::borrow::Cow;
use std::fmt;

use crate::error::UsageError;
use crate::exchange::Exchange;

type Callback = Box<dyn FnOnce(Exchange, bool) + Send + 'static>;

/// 一次性延续：处理单元完成修改后，借它把 Exchange 与“是否同步完成”标志交还给调用方。
///
/// # 契约说明（What）
/// - [`Continuation::done`] 按值消耗自身，因此“调用两次”无法通过编译；
/// - 未调用即被丢弃属于契约误用（[`UsageError::ContinuationDropped`]），在 `Drop` 中以 `error` 级别记录；
///   正在 unwind 时不会额外记录，避免掩盖原始 panic；
/// - 闭包需满足 `Send + 'static`，以便在任意线程上完成。
pub struct Continuation {
    callback: Option<Callback>,
    owner: Cow<'static, str>,
}

impl Continuation {
    pub fn new(callback: impl FnOnce(Exchange, bool) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            owner: Cow::Borrowed("anonymous"),
        }
    }

    /// 丢弃结果的延续，常用于“发出即忘”的调用点。
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    /// 标注延续的归属，便于在遗漏调用时定位责任方。
    pub fn with_owner(mut self, owner: impl Into<Cow<'static, str>>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// 发出完成信号。
    pub fn done(mut self, exchange: Exchange, completed_sync: bool) {
        if let Some(callback) = self.callback.take() {
            callback(exchange, completed_sync);
        }
    }
}

impl Drop for Continuation {
    fn drop(&mut self) {
        if self.callback.is_some() && !std::thread::panicking() {
            let violation = UsageError::ContinuationDropped {
                unit: self.owner.to_string(),
            };
            tracing::error!(error = %violation, "processing contract violated");
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("owner", &self.owner)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}
