//! 各引导阶段
//!
//! 每个阶段是一个独立函数，接收请求上下文（以及需要时的请求本身），
//! 返回 `PhaseOutcome` 或致命错误。计时由管道统一负责。

mod config;
mod debugger;
mod errors;
mod initialize;
mod logger;
mod pages;
mod plugins;
mod session;

use preflight_core::Request;

use crate::context::RuntimeContext;
use crate::phase::{Phase, PhaseResult};

pub use config::initialize_config;
pub use debugger::{initialize_debugger, CLOCKWORK_SEGMENT};
pub use errors::reset_error_handlers;
pub use initialize::initialize_core;
pub use logger::initialize_logger;
pub use pages::initialize_pages;
pub use plugins::load_plugins;
pub use session::{initialize_session, SESSION_CORRUPTION_MESSAGE};

/// 执行单个阶段
pub fn run(phase: Phase, ctx: &mut RuntimeContext, request: &mut Request) -> PhaseResult {
    match phase {
        Phase::Config => initialize_config(ctx),
        Phase::Logger => initialize_logger(ctx),
        Phase::Errors => reset_error_handlers(ctx),
        Phase::Debugger => initialize_debugger(ctx, request),
        Phase::Initialize => initialize_core(ctx, request),
        Phase::Plugins => load_plugins(ctx),
        Phase::Pages => initialize_pages(ctx, request),
        Phase::Session => initialize_session(ctx),
    }
}
