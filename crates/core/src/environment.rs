//! 进程环境
//!
//! 时区、区域设置这类进程级状态集中在 `ProcessEnvironment` 后面，
//! 测试里可以替换成记录型实现，不必改动真实的进程状态。

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// 进程级设置
pub trait ProcessEnvironment: Send + Sync {
    fn set_timezone(&self, timezone: Tz);

    fn set_locale(&self, locale: &str);
}

static ACTIVE_TIMEZONE: Lazy<RwLock<Tz>> = Lazy::new(|| RwLock::new(Tz::UTC));
static ACTIVE_LOCALE: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// 写入进程全局状态的实现，`clock` 模块读取这里设置的值
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl ProcessEnvironment for SystemEnvironment {
    fn set_timezone(&self, timezone: Tz) {
        let mut active = ACTIVE_TIMEZONE.write();
        if *active != timezone {
            tracing::debug!("[Environment] 时区切换: {} -> {}", active.name(), timezone.name());
            *active = timezone;
        }
    }

    fn set_locale(&self, locale: &str) {
        *ACTIVE_LOCALE.write() = Some(locale.to_string());
    }
}

/// 解析 IANA 时区名称
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// 按当前进程时区解释的时钟
pub mod clock {
    use chrono::{DateTime, Utc};
    use chrono_tz::Tz;

    use super::{ACTIVE_LOCALE, ACTIVE_TIMEZONE};

    pub fn timezone() -> Tz {
        *ACTIVE_TIMEZONE.read()
    }

    pub fn now() -> DateTime<Tz> {
        Utc::now().with_timezone(&timezone())
    }

    pub fn locale() -> Option<String> {
        ACTIVE_LOCALE.read().clone()
    }
}
