//! # config 模块说明
//!
//! ## 角色定位（Why）
//! - 把宿主引擎可调的少量策略集中到一份 TOML 配置中：Header 大小写、契约误用的处理方式与日志过滤；
//! - 配置不是摆设：[`CourierSettings::new_exchange`]、[`CourierSettings::manage`] 与
//!   [`CourierSettings::instrument`] 直接消费这些字段。
//!
//! ## 文件格式（What）
//! ```toml
//! headers = "sensitive"
//! usage_violation = "panic"
//!
//! [tracing]
//! filter = "courier_core=debug"
//! trace_exchanges = true
//! ```
//! 所有字段都有默认值，未知字段会被拒绝。

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::exchange::Exchange;
use crate::message::{DefaultMessage, HeaderCase, Value};
use crate::observability::Traced;
use crate::processor::{ManagedProcessor, Processor};

/// 在 `STARTED` 之外收到工作时的处理方式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageViolationPolicy {
    /// 把 [`UsageError`](crate::UsageError) 附着到交换上并同步完成。
    #[default]
    Capture,
    /// 直接 panic，适合测试环境尽早暴露缺陷。
    Panic,
}

/// 日志相关配置。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracingSettings {
    /// `EnvFilter` 语法的过滤指令。
    pub filter: String,
    /// 是否为每个处理单元包裹 `courier.process` span。
    pub trace_exchanges: bool,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            trace_exchanges: false,
        }
    }
}

/// 顶层配置。
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CourierSettings {
    pub headers: HeaderCase,
    pub usage_violation: UsageViolationPolicy,
    pub tracing: TracingSettings,
}

impl CourierSettings {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?settings, "courier settings loaded");
        Ok(settings)
    }

    /// 按配置的 Header 大小写策略创建交换。
    pub fn new_exchange(&self, body: impl Into<Value>) -> Exchange {
        Exchange::new(DefaultMessage::with_header_case(self.headers).with_body(body))
    }

    /// 按配置的误用策略包装处理单元。
    pub fn manage<P>(&self, processor: P) -> ManagedProcessor<P>
    where
        P: Processor,
    {
        ManagedProcessor::new(processor).with_policy(self.usage_violation)
    }

    /// 开启 `trace_exchanges` 时包裹追踪 span，否则原样返回。
    pub fn instrument<P>(&self, processor: P) -> Box<dyn Processor>
    where
        P: Processor + 'static,
    {
        if self.tracing.trace_exchanges {
            Box::new(Traced::new(processor))
        } else {
            Box::new(processor)
        }
    }
}
