//! 调试器初始化与拦截
//!
//! 实时检查（clockwork）开启时记录请求开始时间，
//! 调试器自己的 API 路径直接由调试器响应，后续阶段和下游都不执行。

use preflight_core::{Request, RequestStartTime};

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};

/// 调试器 API 的保留路径段
pub const CLOCKWORK_SEGMENT: &str = "/__clockwork/";

pub fn initialize_debugger(ctx: &mut RuntimeContext, request: &mut Request) -> PhaseResult {
    ctx.debugger.init(&ctx.config);
    if !ctx.debugger.live_inspection() {
        return Ok(PhaseOutcome::Continue);
    }

    // 传输层已经记录过到达时间的话以它为准
    if request.extensions().get::<RequestStartTime>().is_none() {
        request.extensions_mut().insert(RequestStartTime::now());
    }

    if request.uri().path().contains(CLOCKWORK_SEGMENT) {
        tracing::debug!("[Bootstrap] 调试器接管请求: {}", request.uri().path());
        return Ok(PhaseOutcome::ShortCircuit(
            ctx.debugger.debugger_request(request),
        ));
    }

    ctx.live_inspection = true;
    Ok(PhaseOutcome::Continue)
}
