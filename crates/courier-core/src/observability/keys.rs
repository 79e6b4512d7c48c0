//! 结构化日志与追踪使用的字段名，供宿主的日志平台与测试统一引用。
//!
//! `tracing` 宏要求字段名为字面量，这里的常量与库内事件中的字面量保持一致，由
//! `observability` 集成测试校验。

/// 追踪 span 名称。
pub const SPAN_PROCESS: &str = "courier.process";

/// 交换标识。
pub const FIELD_EXCHANGE_ID: &str = "exchange.id";

/// 处理单元的追踪标签。
pub const FIELD_PROCESSOR: &str = "processor";

/// 是否同步完成。
pub const FIELD_COMPLETED_SYNC: &str = "completed_sync";

/// 交换是否携带失败。
pub const FIELD_FAILED: &str = "failed";

/// 生命周期单元名称。
pub const FIELD_UNIT: &str = "unit";

/// 错误描述。
pub const FIELD_ERROR: &str = "error";
