//! 系统设置
//!
//! 引导阶段读取的配置项的类型化投影，由配置初始化阶段一次性生成。

use crate::config::Config;
use crate::error::ConfigResult;

/// 配置键（名称与既有配置文件保持兼容）
pub mod keys {
    pub const LOG_HANDLER: &str = "system.log.handler";
    pub const LOG_SYSLOG_FACILITY: &str = "system.log.syslog.facility";
    pub const CACHE_GZIP: &str = "system.cache.gzip";
    pub const TIMEZONE: &str = "system.timezone";
    pub const DEFAULT_LOCALE: &str = "system.default_locale";
    pub const PAGES_REDIRECT_TRAILING_SLASH: &str = "system.pages.redirect_trailing_slash";
    pub const PAGES_REDIRECT_DEFAULT_CODE: &str = "system.pages.redirect_default_code";
    pub const SESSION_INITIALIZE: &str = "system.session.initialize";
    pub const DEBUGGER_ENABLED: &str = "system.debugger.enabled";
    pub const DEBUGGER_PROVIDER: &str = "system.debugger.provider";
}

/// 日志处理器类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogHandlerKind {
    /// 默认处理器（由宿主安装）
    File,
    Syslog,
    /// 未识别的类型，按默认处理
    Other(String),
}

impl LogHandlerKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "file" => Self::File,
            "syslog" => Self::Syslog,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSettings {
    pub log_handler: LogHandlerKind,
    pub syslog_facility: String,
    pub gzip: bool,
    pub timezone: Option<String>,
    pub default_locale: Option<String>,
    pub redirect_trailing_slash: bool,
    pub redirect_default_code: u16,
    pub session_initialize: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            log_handler: LogHandlerKind::File,
            syslog_facility: "local6".to_string(),
            gzip: false,
            timezone: None,
            default_locale: None,
            redirect_trailing_slash: false,
            redirect_default_code: 302,
            session_initialize: true,
        }
    }
}

impl SystemSettings {
    /// 从配置读取，类型不符时返回 `ConfigError::InvalidValue`
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let defaults = Self::default();
        let handler: String = config.get_or(keys::LOG_HANDLER, "file".to_string())?;

        Ok(Self {
            log_handler: LogHandlerKind::parse(&handler),
            syslog_facility: config.get_or(keys::LOG_SYSLOG_FACILITY, defaults.syslog_facility)?,
            gzip: config.get_or(keys::CACHE_GZIP, defaults.gzip)?,
            timezone: non_empty(config.get_as(keys::TIMEZONE)?),
            default_locale: non_empty(config.get_as(keys::DEFAULT_LOCALE)?),
            redirect_trailing_slash: config.get_or(
                keys::PAGES_REDIRECT_TRAILING_SLASH,
                defaults.redirect_trailing_slash,
            )?,
            redirect_default_code: config
                .get_or(keys::PAGES_REDIRECT_DEFAULT_CODE, defaults.redirect_default_code)?,
            session_initialize: config
                .get_or(keys::SESSION_INITIALIZE, defaults.session_initialize)?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use serde_json::json;

    #[test]
    fn test_default_config_matches_default_settings() {
        let settings = SystemSettings::from_config(&Config::default()).unwrap();
        assert_eq!(settings, SystemSettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_value(json!({
            "system": {
                "log": { "handler": "syslog", "syslog": { "facility": "local3" } },
                "cache": { "gzip": true },
                "timezone": "Asia/Shanghai",
                "default_locale": "",
                "pages": { "redirect_trailing_slash": true, "redirect_default_code": 301 },
                "session": { "initialize": false }
            }
        }));
        let settings = SystemSettings::from_config(&config).unwrap();
        assert_eq!(settings.log_handler, LogHandlerKind::Syslog);
        assert_eq!(settings.syslog_facility, "local3");
        assert!(settings.gzip);
        assert_eq!(settings.timezone.as_deref(), Some("Asia/Shanghai"));
        // 空字符串视为未配置
        assert_eq!(settings.default_locale, None);
        assert!(settings.redirect_trailing_slash);
        assert_eq!(settings.redirect_default_code, 301);
        assert!(!settings.session_initialize);
    }

    #[test]
    fn test_unknown_handler_kind() {
        assert_eq!(
            LogHandlerKind::parse("errorlog"),
            LogHandlerKind::Other("errorlog".to_string())
        );
    }

    #[test]
    fn test_wrong_type_rejected() {
        let config = Config::from_value(json!({"system": {"pages": {"redirect_default_code": "301"}}}));
        assert!(matches!(
            SystemSettings::from_config(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
