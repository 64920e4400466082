//! 阶段定义

use preflight_core::Response;

use crate::error::BootstrapError;

/// 引导阶段，`ORDER` 即执行顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Config,
    Logger,
    Errors,
    Debugger,
    Initialize,
    Plugins,
    Pages,
    Session,
}

impl Phase {
    pub const ORDER: [Phase; 8] = [
        Phase::Config,
        Phase::Logger,
        Phase::Errors,
        Phase::Debugger,
        Phase::Initialize,
        Phase::Plugins,
        Phase::Pages,
        Phase::Session,
    ];

    /// 计时器名称
    pub fn timer_name(&self) -> &'static str {
        match self {
            Phase::Config => "_config",
            Phase::Logger => "_logger",
            Phase::Errors => "_errors",
            Phase::Debugger => "_debugger",
            Phase::Initialize => "_init",
            Phase::Plugins => "_plugins_load",
            Phase::Pages => "_pages_register",
            Phase::Session => "_session",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Config => "Configuration",
            Phase::Logger => "Logger",
            Phase::Errors => "Error Handlers Reset",
            Phase::Debugger => "Init Debugger",
            Phase::Initialize => "Initialize",
            Phase::Plugins => "Load Plugins",
            Phase::Pages => "Register Pages",
            Phase::Session => "Start Session",
        }
    }
}

/// 阶段结果
#[derive(Debug)]
pub enum PhaseOutcome {
    /// 继续下一阶段
    Continue,
    /// 终止后续阶段，直接返回该响应，不调用下游
    ShortCircuit(Response),
    /// 阶段失败后已自愈，消息写入消息收集器后继续
    Recovered(String),
}

pub type PhaseResult = Result<PhaseOutcome, BootstrapError>;
