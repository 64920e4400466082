//! 诊断
//!
//! - 阶段计时（`TimerRecorder` / `PhaseRecord`）
//! - 面向用户的消息收集（`Messages`）

mod messages;
mod timers;

pub use messages::{Message, Messages, Severity};
pub use timers::{PhaseRecord, TimerRecorder};
