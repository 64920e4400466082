//! 会话初始化
//!
//! 会话数据损坏时无条件重试一次（重置会话），重试结果即最终结果。
//! 其他会话错误直接作为致命错误向上传播。

use crate::context::RuntimeContext;
use crate::error::SessionError;
use crate::phase::{PhaseOutcome, PhaseResult};
use crate::retry::{retry_once_on, Attempt};

pub const SESSION_CORRUPTION_MESSAGE: &str = "Session corruption detected, restarting session...";

pub fn initialize_session(ctx: &mut RuntimeContext) -> PhaseResult {
    let Some(session) = ctx.session.clone() else {
        return Ok(PhaseOutcome::Continue);
    };
    if !ctx.settings.session_initialize {
        return Ok(PhaseOutcome::Continue);
    }

    match retry_once_on(|| session.init(), SessionError::is_corruption)? {
        Attempt::First(()) => Ok(PhaseOutcome::Continue),
        Attempt::Retried { first_error, .. } => {
            tracing::warn!("[Bootstrap] 会话已重置: {}", first_error);
            Ok(PhaseOutcome::Recovered(
                SESSION_CORRUPTION_MESSAGE.to_string(),
            ))
        }
    }
}
