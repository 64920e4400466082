//! 页面注册与尾部斜杠重定向
//!
//! 在会话和页面内容处理之前规范化 URL。

use preflight_core::{redirect_response, Request};

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};
use crate::uri::UriState;

pub fn initialize_pages(ctx: &mut RuntimeContext, request: &Request) -> PhaseResult {
    ctx.pages.register()?;
    ctx.uri = UriState::from_request(request);

    if ctx.settings.redirect_trailing_slash && ctx.uri.has_trailing_slash() {
        let route = ctx.uri.canonical_route();
        tracing::debug!(
            "[Bootstrap] 尾部斜杠重定向: {} -> {}",
            ctx.uri.path(),
            route
        );
        return Ok(PhaseOutcome::ShortCircuit(redirect_response(
            &route,
            ctx.settings.redirect_default_code,
        )));
    }

    Ok(PhaseOutcome::Continue)
}
