//! 错误处理器重置

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};

pub fn reset_error_handlers(ctx: &mut RuntimeContext) -> PhaseResult {
    ctx.errors.reset_handlers();
    Ok(PhaseOutcome::Continue)
}
