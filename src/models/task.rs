use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TaskId;

/// Placeholder shown for absent task fields.
pub const MISSING: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }

    /// A terminal task receives no further progress.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub fn is_terminal_str(status: &str) -> bool {
        Self::from(status.to_string()).is_terminal()
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A crawler task as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: TaskId,
    pub task_type: String,
    pub status: TaskStatus,
    /// JSON-encoded creation parameters.
    pub parameters: Option<String>,
    pub result_summary: Option<String>,
    pub created_at: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub percentage: Option<f64>,
    pub processed_items: Option<u64>,
    pub total_items: Option<u64>,
    pub processing_speed: Option<f64>,
    pub estimated_remaining: Option<f64>,
}

impl Task {
    /// Shallow-merges pushed fields over this task.
    ///
    /// Fields the update does not mention keep their value. Fields whose
    /// new value does not fit the model are ignored rather than failing
    /// the whole update.
    #[must_use]
    pub fn merged(&self, update: &Map<String, Value>) -> Self {
        let Ok(Value::Object(mut current)) = serde_json::to_value(self) else {
            return self.clone();
        };

        for (key, value) in update {
            if !current.contains_key(key) {
                continue;
            }
            let previous = current.insert(key.clone(), value.clone());
            if serde_json::from_value::<Self>(Value::Object(current.clone())).is_err() {
                tracing::debug!(task_id = self.id, field = %key, "Ignoring ill-typed pushed field");
                if let Some(previous) = previous {
                    current.insert(key.clone(), previous);
                }
            }
        }

        serde_json::from_value(Value::Object(current)).unwrap_or_else(|_| self.clone())
    }

    /// Looks up a creation parameter for display.
    ///
    /// `mode` reports the bangumi id instead when the task targeted a single
    /// subject. Missing or unparseable parameters read as [`MISSING`].
    #[must_use]
    pub fn parameter(&self, key: &str) -> String {
        let Some(raw) = self.parameters.as_deref() else {
            return MISSING.to_string();
        };
        let params: Map<String, Value> = match serde_json::from_str(raw) {
            Ok(params) => params,
            Err(e) => {
                tracing::debug!(task_id = self.id, "Failed to parse task parameters: {e}");
                return MISSING.to_string();
            }
        };

        if key == "mode" {
            if let Some(id) = params.get("bangumi_id").filter(|v| is_truthy(v)) {
                return format!("bangumi_id: {}", display_value(id));
            }
        }

        params
            .get(key)
            .filter(|v| is_truthy(v))
            .map_or_else(|| MISSING.to_string(), display_value)
    }

    #[must_use]
    pub fn eta(&self) -> String {
        format_eta(self.estimated_remaining)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders remaining seconds as `"{m}m {s}s"`.
#[must_use]
pub fn format_eta(seconds: Option<f64>) -> String {
    match seconds {
        Some(secs) if secs >= 0.0 => {
            let total = secs.floor() as u64;
            format!("{}m {}s", total / 60, total % 60)
        }
        _ => MISSING.to_string(),
    }
}

/// Renders a backend timestamp in local time.
///
/// Offset-less timestamps are taken as-is. Unparseable input is returned
/// unchanged.
#[must_use]
pub fn format_datetime(value: Option<&str>) -> String {
    let Some(raw) = value.filter(|s| !s.is_empty()) else {
        return MISSING.to_string();
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}

/// Request body for starting a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreate {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskProgress {
    pub task_id: TaskId,
    pub percentage: Option<f64>,
    pub processed_items: Option<u64>,
    pub total_items: Option<u64>,
    pub processing_speed: Option<f64>,
    pub estimated_remaining: Option<f64>,
}
