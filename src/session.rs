//! 内存会话存储
//!
//! 会话 ID 来自 cookie，数据以 JSON 文本保存。无法解码的数据视为损坏，
//! 检测到时立即清除，下一次初始化会建立新会话。
//! 存储有容量上限，满了以后淘汰最久未初始化的会话。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use preflight_processor::{Session, SessionError};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "preflight_session";

/// 请求携带的会话 ID（请求扩展属性）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 从 Cookie 头解析
    pub fn from_cookie_header(header: &str) -> Option<Self> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub created_at: DateTime<Utc>,
    pub visits: u64,
}

/// 默认最多保留的会话数
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

struct StoredSession {
    blob: String,
    touched: u64,
}

#[derive(Default)]
struct SessionTable {
    entries: HashMap<String, StoredSession>,
    tick: u64,
}

impl SessionTable {
    fn insert(&mut self, id: String, blob: String, capacity: usize) {
        if !self.entries.contains_key(&id) && self.entries.len() >= capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, stored)| stored.touched)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
                tracing::debug!("[Session] 存储已满，淘汰会话 {}", oldest);
            }
        }
        self.tick += 1;
        let touched = self.tick;
        self.entries.insert(id, StoredSession { blob, touched });
    }
}

pub struct MemorySessionStore {
    capacity: usize,
    table: RwLock<SessionTable>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            table: RwLock::new(SessionTable::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionData> {
        self.table
            .read()
            .entries
            .get(id.as_str())
            .and_then(|stored| serde_json::from_str(&stored.blob).ok())
    }

    /// 直接写入原始数据
    pub fn put_raw(&self, id: &SessionId, blob: impl Into<String>) {
        self.table
            .write()
            .insert(id.0.clone(), blob.into(), self.capacity);
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.table.read().entries.contains_key(id.as_str())
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 绑定到单个请求的会话
pub struct CookieSession {
    store: Arc<MemorySessionStore>,
    id: SessionId,
}

impl CookieSession {
    pub fn new(store: Arc<MemorySessionStore>, id: SessionId) -> Self {
        Self { store, id }
    }
}

impl Session for CookieSession {
    fn init(&self) -> Result<(), SessionError> {
        let mut table = self.store.table.write();

        let stored = table
            .entries
            .get(self.id.as_str())
            .map(|stored| serde_json::from_str::<SessionData>(&stored.blob));

        let data = match stored {
            None => SessionData {
                created_at: Utc::now(),
                visits: 1,
            },
            Some(Ok(mut data)) => {
                data.visits += 1;
                data
            }
            Some(Err(e)) => {
                table.entries.remove(self.id.as_str());
                return Err(SessionError::Corruption(e.to_string()));
            }
        };

        let blob = serde_json::to_string(&data).map_err(|e| SessionError::Other(e.to_string()))?;
        table.insert(self.id.0.clone(), blob, self.store.capacity);
        Ok(())
    }
}
