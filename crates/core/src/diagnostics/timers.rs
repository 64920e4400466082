//! 阶段计时器

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 单个阶段的计时记录
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    /// 计时器名称（如 `_config`）
    pub name: String,
    /// 显示名称
    pub label: String,
    pub started_at: DateTime<Utc>,
    /// 未停止前为 `None`
    pub ended_at: Option<DateTime<Utc>>,
    /// 耗时（毫秒）
    pub duration_ms: Option<f64>,
    #[serde(skip)]
    started: Instant,
}

impl PhaseRecord {
    fn open(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            started: Instant::now(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms
            .map(|ms| Duration::from_secs_f64(ms / 1000.0))
    }
}

/// 计时记录器
///
/// 按开始顺序保存记录。每条记录只能停止一次。
#[derive(Debug, Clone, Default)]
pub struct TimerRecorder {
    records: Vec<PhaseRecord>,
}

impl TimerRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, name: &str, label: &str) {
        self.records.push(PhaseRecord::open(name, label));
    }

    /// 停止最近一个同名且未停止的计时器，没有可停止的记录时返回 `false`
    pub fn stop(&mut self, name: &str) -> bool {
        let Some(record) = self
            .records
            .iter_mut()
            .rev()
            .find(|r| r.name == name && !r.is_stopped())
        else {
            tracing::debug!("[Timer] 计时器未开始或已停止: {}", name);
            return false;
        };

        let elapsed = record.started.elapsed();
        record.ended_at = Some(Utc::now());
        record.duration_ms = Some(elapsed.as_secs_f64() * 1000.0);
        true
    }

    pub fn records(&self) -> &[PhaseRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&PhaseRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// 所有已开始的计时器是否都已停止
    pub fn is_balanced(&self) -> bool {
        self.records.iter().all(PhaseRecord::is_stopped)
    }
}
