//! 引导管道
//!
//! 按 `Phase::ORDER` 顺序执行各阶段，每个阶段都包在计时器里。
//! 计时器在阶段返回后无条件停止，致命错误也不例外，
//! 所以任何一次运行结束后 `ctx.timers` 都是平衡的。

use preflight_core::{Request, RequestSummary, Response, Severity};

use crate::context::RuntimeContext;
use crate::delegate::Delegate;
use crate::error::BootstrapError;
use crate::phase::{Phase, PhaseOutcome, PhaseResult};
use crate::phases;


/// 请求初始化处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct InitializeProcessor;

impl InitializeProcessor {
    pub const ID: &'static str = "_init";
    pub const TITLE: &'static str = "Initialize";

    pub fn new() -> Self {
        Self
    }

    /// 执行全部引导阶段，然后把请求交给下游
    ///
    /// 阶段短路时直接返回该响应，下游不会被调用。
    /// 运行中产生的消息以 `Messages` 扩展附在响应上。
    pub async fn process(
        &self,
        ctx: &mut RuntimeContext,
        mut request: Request,
        delegate: &dyn Delegate,
    ) -> Result<Response, BootstrapError> {
        for phase in Phase::ORDER {
            match run_timed(phase, ctx, &mut request)? {
                PhaseOutcome::Continue => {}
                PhaseOutcome::ShortCircuit(response) => {
                    tracing::debug!(
                        "[Bootstrap] {} 阶段提前返回: {}",
                        phase.label(),
                        response.status()
                    );
                    return Ok(response);
                }
                PhaseOutcome::Recovered(message) => {
                    ctx.debugger.add_message(&message, Severity::Error);
                    ctx.messages.add(message, Severity::Error);
                }
            }
        }

        let summary = RequestSummary::from_request(&request);

        let scope = ctx.debugger.begin_profile();
        let response = delegate.handle(request).await;
        ctx.debugger.end_profile(scope);

        let response = ctx.output.flush(response).await;
        let summary = summary.with_phases(ctx.timers.records());
        let mut response = ctx.debugger.log_request(&summary, response);
        if !ctx.messages.is_empty() {
            response.extensions_mut().insert(ctx.messages.clone());
        }
        Ok(response)
    }
}

fn run_timed(phase: Phase, ctx: &mut RuntimeContext, request: &mut Request) -> PhaseResult {
    ctx.timers.start(phase.timer_name(), phase.label());
    let result = phases::run(phase, ctx, request);
    ctx.timers.stop(phase.timer_name());

    if let Err(e) = &result {
        ctx.logger
            .error(format!("{} failed: {}", phase.label(), e));
    }
    result
}
