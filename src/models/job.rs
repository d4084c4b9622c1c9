use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A cron-scheduled crawl.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduledJob {
    pub id: Option<u64>,
    pub job_id: String,
    pub name: String,
    pub cron_expression: String,
    pub parameters: Value,
    pub enabled: bool,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ScheduledJob {
    /// Shallow-merges pushed fields, ignoring ones that do not fit.
    #[must_use]
    pub fn merged(&self, update: &Map<String, Value>) -> Self {
        let Ok(Value::Object(mut current)) = serde_json::to_value(self) else {
            return self.clone();
        };
        for (key, value) in update {
            if current.contains_key(key) {
                current.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(current)).unwrap_or_else(|_| self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCreate {
    pub job_id: String,
    pub name: String,
    pub cron_expression: String,
    pub parameters: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JobUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
