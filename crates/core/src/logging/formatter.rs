//! 单行格式化器
//!
//! 支持的占位符：`%datetime%` `%channel%` `%level_name%` `%message%` `%context%` `%extra%`。
//! 未识别的占位符原样保留。

use serde_json::{Map, Value};

use super::LogRecord;

/// syslog 处理器使用的固定行格式
pub const SYSLOG_LINE_FORMAT: &str = "%channel%.%level_name%: %message% %extra%";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormatter {
    format: String,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new("[%datetime%] %channel%.%level_name%: %message% %context% %extra%")
    }
}

impl LineFormatter {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn format_string(&self) -> &str {
        &self.format
    }

    pub fn format(&self, record: &LogRecord) -> String {
        let mut output = String::with_capacity(self.format.len() + record.message.len());
        let mut rest = self.format.as_str();

        // 单遍扫描，消息正文里的 `%xxx%` 不会被二次替换
        while let Some(start) = rest.find('%') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('%') else {
                output.push_str(&rest[start..]);
                return output;
            };

            let placeholder = &after[..end];
            match render_placeholder(placeholder, record) {
                Some(value) => {
                    output.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    output.push('%');
                    rest = after;
                }
            }
        }
        output.push_str(rest);
        output
    }
}

fn render_placeholder(name: &str, record: &LogRecord) -> Option<String> {
    let value = match name {
        "datetime" => record.datetime.to_rfc3339(),
        "channel" => record.channel.clone(),
        "level_name" => record.level.name().to_string(),
        "message" => record.message.clone(),
        "context" => render_map(&record.context),
        "extra" => render_map(&record.extra),
        _ => return None,
    };
    Some(value)
}

fn render_map(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        "[]".to_string()
    } else {
        Value::Object(map.clone()).to_string()
    }
}
