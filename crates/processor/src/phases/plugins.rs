//! 插件加载

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};

pub fn load_plugins(ctx: &mut RuntimeContext) -> PhaseResult {
    ctx.plugins.init()?;
    Ok(PhaseOutcome::Continue)
}
