//! 消息收集
//!
//! 请求期间产生、需要展示给用户或记录到调试器的消息。

use serde::{Deserialize, Serialize};

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default)]
pub struct Messages {
    items: Vec<Message>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: impl Into<String>, severity: Severity) {
        self.items.push(Message {
            text: text.into(),
            severity,
        });
    }

    pub fn all(&self) -> &[Message] {
        &self.items
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Message> {
        self.items.iter().filter(move |m| m.severity == severity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
