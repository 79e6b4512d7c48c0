use std::fmt;

/// 处理单元的生命周期状态。
///
/// # 契约说明（What）
/// - 主干：`New → Starting → Started → Stopping → Stopped`，`Stopped` 可再次启动；
/// - `Failed` 只能从 `Starting` 或 `Stopping` 进入（对应钩子报错），进入后不再离开；
/// - 只有 `Started` 可以接收工作。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServiceState {
    #[default]
    New,
    Starting,
    Started,
    Stopping,
    Stopped,
    Failed,
}

impl ServiceState {
    /// 是否允许接收 `process` 调用。
    pub const fn accepts_work(self) -> bool {
        matches!(self, ServiceState::Started)
    }

    /// 是否处于转换中间态。
    pub const fn is_transitioning(self) -> bool {
        matches!(self, ServiceState::Starting | ServiceState::Stopping)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ServiceState::New => "New",
            ServiceState::Starting => "Starting",
            ServiceState::Started => "Started",
            ServiceState::Stopping => "Stopping",
            ServiceState::Stopped => "Stopped",
            ServiceState::Failed => "Failed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生命周期的两个方向。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Start,
    Stop,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecyclePhase::Start => "start",
            LifecyclePhase::Stop => "stop",
        })
    }
}

/// 驱动生命周期状态机的输入信号。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleSignal {
    StartRequested,
    StartSucceeded,
    StartFailed,
    StopRequested,
    StopSucceeded,
    StopFailed,
}

/// 状态推进结果，配合 [`ContractStateMachine`] 描述状态转换效果。
///
/// # 设计目标（Why）
/// - 让状态机实现者在返回值中明确指示“是否发生状态跃迁”，便于上层据此记录日志；
/// - 区分 `Noop` 与 `Transition`，避免上层重复记录或误判。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateAdvance<S>
where
    S: Copy + Eq,
{
    /// 状态未变化，通常表示收到重复信号或当前状态不接受该信号。
    Noop { state: S },
    /// 状态发生跃迁。
    Transition { from: S, to: S },
}

impl<S> StateAdvance<S>
where
    S: Copy + Eq,
{
    /// 推进后的状态。
    pub fn state(&self) -> S {
        match self {
            StateAdvance::Noop { state } => *state,
            StateAdvance::Transition { to, .. } => *to,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, StateAdvance::Transition { .. })
    }
}

/// 最小状态机接口：状态查询 + 信号驱动。
///
/// # 契约说明（What）
/// - `state()` 为无副作用读取；
/// - `on_signal(signal)` 根据输入推进状态，返回 [`StateAdvance`]；
/// - 返回 `Noop` 时状态必须保持不变；
/// - 接口不规定同步策略，调用方需根据实现文档决定是否需要外部锁。
pub trait ContractStateMachine {
    /// 状态枚举类型。
    type State: Copy + Eq;
    /// 驱动状态的信号。
    type Signal;

    fn state(&self) -> Self::State;

    fn on_signal(&mut self, signal: &Self::Signal) -> StateAdvance<Self::State>;
}

/// 生命周期状态机的纯数据实现，不含钩子调用与同步。
///
/// 转换表：
///
/// | 当前 | 信号 | 目标 |
/// |------|------|------|
/// | New / Stopped | StartRequested | Starting |
/// | Starting | StartSucceeded | Started |
/// | Starting | StartFailed | Failed |
/// | Started | StopRequested | Stopping |
/// | Stopping | StopSucceeded | Stopped |
/// | Stopping | StopFailed | Failed |
///
/// 其余组合一律 `Noop`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecycleStateMachine {
    state: ServiceState,
}

impl LifecycleStateMachine {
    pub const fn new() -> Self {
        Self {
            state: ServiceState::New,
        }
    }

    fn target(&self, signal: LifecycleSignal) -> Option<ServiceState> {
        use LifecycleSignal as Sig;
        use ServiceState as St;

        match (self.state, signal) {
            (St::New | St::Stopped, Sig::StartRequested) => Some(St::Starting),
            (St::Starting, Sig::StartSucceeded) => Some(St::Started),
            (St::Starting, Sig::StartFailed) => Some(St::Failed),
            (St::Started, Sig::StopRequested) => Some(St::Stopping),
            (St::Stopping, Sig::StopSucceeded) => Some(St::Stopped),
            (St::Stopping, Sig::StopFailed) => Some(St::Failed),
            _ => None,
        }
    }
}

impl ContractStateMachine for LifecycleStateMachine {
    type State = ServiceState;
    type Signal = LifecycleSignal;

    fn state(&self) -> ServiceState {
        self.state
    }

    fn on_signal(&mut self, signal: &LifecycleSignal) -> StateAdvance<ServiceState> {
        match self.target(*signal) {
            Some(to) => {
                let from = std::mem::replace(&mut self.state, to);
                StateAdvance::Transition { from, to }
            }
            None => StateAdvance::Noop { state: self.state },
        }
    }
}
