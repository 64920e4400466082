//! 配置初始化

use preflight_core::{Config, SystemSettings};

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};

/// 从配置源重新加载配置，然后让插件注册表准备清单
pub fn initialize_config(ctx: &mut RuntimeContext) -> PhaseResult {
    let config = Config::load(ctx.config_source.as_ref())?;
    let settings = SystemSettings::from_config(&config)?;

    ctx.config = config;
    ctx.settings = settings;
    ctx.plugins.setup(&ctx.config)?;

    tracing::debug!(
        "[Bootstrap] 配置已加载: {}",
        ctx.config_source.describe()
    );
    Ok(PhaseOutcome::Continue)
}
