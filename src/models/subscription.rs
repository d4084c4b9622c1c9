use serde::{Deserialize, Serialize};

use super::SubjectId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscription {
    pub id: Option<u64>,
    pub user_id: String,
    pub bangumi_id: SubjectId,
    /// Unix seconds.
    pub subscribed_at: i64,
    pub notes: Option<String>,
    pub anime_name: Option<String>,
    pub anime_name_cn: Option<String>,
    pub anime_rating: Option<f64>,
    pub anime_air_date: Option<String>,
    pub anime_air_weekday: Option<u8>,
}

impl Subscription {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.anime_name_cn
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.anime_name.as_deref())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn subscribed_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.subscribed_at, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionPagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub pages: u32,
}

impl Default for SubscriptionPagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            total: 0,
            pages: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionList {
    pub subscriptions: Vec<Subscription>,
    pub pagination: SubscriptionPagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionIds {
    pub ids: Vec<SubjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
    pub subscribed_at: Option<i64>,
    pub notes: Option<String>,
}

/// Sort and filter options for listing subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionQuery {
    pub sort: String,
    pub order: String,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for SubscriptionQuery {
    fn default() -> Self {
        Self {
            sort: "subscribed_at".to_string(),
            order: "desc".to_string(),
            search: None,
            page: 1,
            limit: 20,
        }
    }
}
