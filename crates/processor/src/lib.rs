//! Preflight Processor Crate
//!
//! 请求引导管道：按固定顺序执行各初始化阶段，逐个计时，
//! 支持阶段提前返回响应（短路）和会话损坏的自愈，最后交给下游处理器。
//!
//! 外部协作方（插件、页面、会话、调试器等）只以 trait 形式出现在这里，
//! 具体实现由应用层提供。

pub mod collaborators;
pub mod context;
pub mod delegate;
pub mod error;
pub mod phase;
pub mod phases;
pub mod pipeline;
pub mod retry;
pub mod uri;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{
    Debugger, EmptyPageRegistry, EmptyPluginRegistry, ErrorHandlers, NullDebugger, PageRegistry,
    PanicHookHandlers, PluginRegistry, ProfileScope, Session,
};
pub use context::{RuntimeContext, Services};
pub use delegate::Delegate;
pub use error::{BootstrapError, PageError, PluginError, SessionError};
pub use phase::{Phase, PhaseOutcome, PhaseResult};
pub use pipeline::InitializeProcessor;
pub use retry::{retry_once_on, Attempt};
pub use uri::UriState;
