//! 可观测性：`tracing` 订阅器安装入口与处理单元追踪包装。
//!
//! # 结构概览
//! - [`install_subscriber`]：按 [`TracingSettings`] 组装 `fmt + EnvFilter` 并设置为全局订阅器；
//! - [`Traced`]：为任意处理单元包裹 `courier.process` span；
//! - [`keys`]：字段名常量。

pub mod keys;
mod traced;

use thiserror::Error;
use tracing::dispatcher;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

pub use traced::Traced;

use crate::config::TracingSettings;

/// 安装全局订阅器时可能出现的错误。
#[derive(Debug, Error)]
pub enum InstallError {
    /// 进程内已经存在全局订阅器（可能由本函数或宿主自行设置）。
    #[error("a global tracing subscriber is already installed")]
    SubscriberAlreadySet,

    /// 过滤指令无法解析。
    #[error("invalid tracing filter `{filter}`")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// 底层设置失败。
    #[error("failed to set the global tracing subscriber")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// 安装 `fmt + EnvFilter` 全局订阅器。
///
/// # 契约说明（What）
/// - 环境变量 `RUST_LOG` 存在时优先于 `settings.filter`；
/// - 进程内只能成功一次，之后的调用返回 [`InstallError::SubscriberAlreadySet`] 而不是 panic。
pub fn install_subscriber(settings: &TracingSettings) -> Result<(), InstallError> {
    if dispatcher::has_been_set() {
        return Err(InstallError::SubscriberAlreadySet);
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.filter).map_err(|source| {
            InstallError::InvalidFilter {
                filter: settings.filter.clone(),
                source,
            }
        })?,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_an_error() {
        let settings = TracingSettings::default();
        // 第一次调用是否成功取决于测试执行顺序，只断言之后的调用。
        let _ = install_subscriber(&settings);
        assert!(matches!(
            install_subscriber(&settings),
            Err(InstallError::SubscriberAlreadySet)
        ));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let settings = TracingSettings {
            filter: "courier_core=loud".to_owned(),
            trace_exchanges: false,
        };
        if dispatcher::has_been_set() || std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            install_subscriber(&settings),
            Err(InstallError::InvalidFilter { .. }) | Err(InstallError::SubscriberAlreadySet)
        ));
    }
}
