// 启用 `loom-model` 且以 `--cfg courier_loom` 编译时切换到 Loom 原子类型，让模型检查覆盖全部交错。
#[cfg(all(feature = "loom-model", any(loom, courier_loom)))]
use loom::sync::atomic::{AtomicU8, Ordering};
#[cfg(not(all(feature = "loom-model", any(loom, courier_loom))))]
use std::sync::atomic::{AtomicU8, Ordering};

const OPEN: u8 = 0;
const CLOSED: u8 = 1;
const COMPLETED_INLINE: u8 = 2;

/// 调用窗口：判定组合单元的最终完成究竟发生在 `process` 返回之前还是之后。
///
/// # 设计背景（Why）
/// - 组合单元（如 [`Pipeline`](super::Pipeline)）的返回值与传给延续的标志必须一致，
///   而内部阶段可能在任意线程上完成；
/// - 单个原子三态即可无竞争地裁决：`OPEN` 期间完成记为同步，`CLOSED` 之后完成记为异步。
///
/// # 契约说明（What）
/// - 每个窗口只调用一次 [`complete`](Self::complete)（由最终延续调用）与一次 [`close`](Self::close)
///   （由 `process` 返回前调用）；
/// - `complete()` 返回 `true` 当且仅当 `close()` 返回 `true`，两者永远给出相同结论。
#[derive(Debug)]
pub struct CompletionWindow {
    state: AtomicU8,
}

impl CompletionWindow {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(OPEN),
        }
    }

    /// 最终完成时调用；返回完成是否发生在窗口之内（即同步完成）。
    pub fn complete(&self) -> bool {
        self.state
            .compare_exchange(OPEN, COMPLETED_INLINE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `process` 返回前调用；返回值即 `process` 的返回值。
    pub fn close(&self) -> bool {
        match self
            .state
            .compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => false,
            Err(observed) => observed == COMPLETED_INLINE,
        }
    }
}

impl Default for CompletionWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(all(feature = "loom-model", any(loom, courier_loom)))))]
mod tests {
    use super::*;

    #[test]
    fn completion_inside_window_is_sync() {
        let window = CompletionWindow::new();
        assert!(window.complete());
        assert!(window.close());
    }

    #[test]
    fn completion_after_close_is_async() {
        let window = CompletionWindow::new();
        assert!(!window.close());
        assert!(!window.complete());
    }
}
