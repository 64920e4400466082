//! 核心初始化
//!
//! 必须在任何输出产生之前完成：输出缓冲（可选 gzip）、时区、区域设置。

use preflight_core::{parse_timezone, OutputBuffer, Request, Severity};

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};

pub fn initialize_core(ctx: &mut RuntimeContext, request: &Request) -> PhaseResult {
    ctx.output = OutputBuffer::negotiate(ctx.settings.gzip, request.headers(), ctx.output_limit);

    if let Some(name) = ctx.settings.timezone.as_deref() {
        match parse_timezone(name) {
            Some(timezone) => ctx.environment.set_timezone(timezone),
            None => {
                tracing::warn!("[Bootstrap] 未知时区，保持当前时区: {}", name);
                ctx.debugger
                    .add_message(&format!("Unknown timezone: {}", name), Severity::Warning);
            }
        }
    }

    if let Some(locale) = ctx.settings.default_locale.as_deref() {
        ctx.environment.set_locale(locale);
    }

    Ok(PhaseOutcome::Continue)
}
