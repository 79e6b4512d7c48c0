//! Courier 处理契约测试套件（TCK）入口。
//!
//! # 教案式综述（Why / How / What）
//! - **为什么存在**：任何自定义处理单元、消息表示或组合单元都必须遵守同一份契约（延续恰好一次、返回值与
//!   同步标志一致、失败随交换流动、只在 `STARTED` 接收工作）。本 crate 把这些约束固化为可复用的用例；
//! - **如何集成**：在目标仓库的 `tests` 目录下使用 `#[courier_tck]` 宏（或直接调用 `run_*` 入口），即可把套件
//!   编译为标准的 Rust 测试；针对自有实现，调用 [`verify`] 模块中的 `verify_*` 函数；
//! - **测试对象**：以 `courier-core` 暴露的稳定面为边界。
//!
//! # 模块结构
//! - `case`：用例与套件的元信息，以及统一的执行辅助；
//! - `message`、`exchange`、`lifecycle`、`processor`、`adapter`：五个主题的断言逻辑；
//! - [`verify`]：面向第三方实现的可复用检查。

mod adapter;
mod exchange;
mod lifecycle;
mod message;
mod processor;
mod support;
pub mod verify;

use case::run_suite;
pub use courier_contract_tests_macros::courier_tck;

const ALL_SUITES: [&TckSuite; 5] = [
    message::suite(),
    exchange::suite(),
    lifecycle::suite(),
    processor::suite(),
    adapter::suite(),
];

mod case {
    use super::support;
    use std::panic;

    /// 单个 TCK 用例：名称加零参数测试函数，失败时必须 panic。
    #[derive(Clone, Copy)]
    pub struct TckCase {
        pub name: &'static str,
        pub test: fn(),
    }

    /// 同一主题的一组用例，`cases` 不允许为空。
    #[derive(Clone, Copy)]
    pub struct TckSuite {
        pub name: &'static str,
        pub cases: &'static [TckCase],
    }

    /// 在捕获 panic 的前提下执行整个套件，失败时附加“套件/用例”上下文后重新抛出。
    pub fn run_suite(suite: &TckSuite) {
        assert!(!suite.cases.is_empty(), "TCK 套件不应为空");
        for case in suite.cases {
            let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| (case.test)()));
            if let Err(payload) = outcome {
                support::panic_with_context(suite.name, case.name, payload);
            }
        }
    }
}

pub use case::{TckCase, TckSuite};

/// 返回所有已注册的套件，顺序与宏默认展开顺序一致。
pub fn all_suites() -> &'static [&'static TckSuite] {
    &ALL_SUITES
}

/// 运行“消息”主题：`copy_from` 语义、Header 大小写策略、消息体不做类型校验。
pub fn run_message_suite() {
    run_suite(message::suite());
}

/// 运行“交换”主题：槽位访问、当前槽位判定、失败的后写覆盖。
pub fn run_exchange_suite() {
    run_suite(exchange::suite());
}

/// 运行“生命周期”主题：转换表、吸收态与受管单元的误用检测。
pub fn run_lifecycle_suite() {
    run_suite(lifecycle::suite());
}

/// 运行“处理单元”主题：延续恰好一次、同步/异步标志一致、失败随交换流动。
pub fn run_processor_suite() {
    run_suite(processor::suite());
}

/// 运行“适配器”主题：同步单元的错误捕获与原生 Future 桥接。
pub fn run_adapter_suite() {
    run_suite(adapter::suite());
}
