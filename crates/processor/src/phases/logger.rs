//! 日志初始化
//!
//! 配置为 `syslog` 时把默认处理器换成 syslog 处理器，其他取值不做任何事。

use std::sync::Arc;

use preflight_core::{
    keys, ConfigError, Facility, LogHandlerKind, SyslogHandler, SYSLOG_IDENT,
};

use crate::context::RuntimeContext;
use crate::phase::{PhaseOutcome, PhaseResult};

pub fn initialize_logger(ctx: &mut RuntimeContext) -> PhaseResult {
    if ctx.settings.log_handler != LogHandlerKind::Syslog {
        return Ok(PhaseOutcome::Continue);
    }

    let facility = Facility::parse(&ctx.settings.syslog_facility).ok_or_else(|| {
        ConfigError::InvalidValue {
            key: keys::LOG_SYSLOG_FACILITY.to_string(),
            message: format!("未知的 syslog facility: {}", ctx.settings.syslog_facility),
        }
    })?;

    // 同一配置重复执行时保持原处理器
    if let Some(active) = ctx.logger.active_handler() {
        if let Some(existing) = active.as_any().downcast_ref::<SyslogHandler>() {
            if existing.facility() == facility {
                return Ok(PhaseOutcome::Continue);
            }
        }
    }

    let previous = ctx
        .logger
        .replace_active(Arc::new(SyslogHandler::new(SYSLOG_IDENT, facility)));
    tracing::info!(
        "[Bootstrap] 日志处理器切换: {} -> syslog ({})",
        previous.as_ref().map(|h| h.name()).unwrap_or("none"),
        facility.as_str()
    );
    Ok(PhaseOutcome::Continue)
}
