use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SubjectId;

/// Subject type code Bangumi uses for anime.
pub const ANIME_SUBJECT_TYPE: u8 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rating {
    pub total: u32,
    /// Votes per score bucket, keyed "1".."10".
    pub count: BTreeMap<String, u32>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub large: String,
    pub common: String,
    pub medium: String,
    pub small: String,
    pub grid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    pub wish: u32,
    pub collect: u32,
    pub doing: u32,
    pub on_hold: u32,
    pub dropped: u32,
}

impl Collection {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.wish + self.collect + self.doing + self.on_hold + self.dropped
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub name_cn: String,
    pub summary: String,
    pub date: Option<String>,
    pub air_date: Option<String>,
    pub air_weekday: Option<u8>,
    pub eps: Option<u32>,
    pub total_episodes: Option<u32>,
    pub rating: Rating,
    pub rank: Option<u32>,
    pub images: Images,
    pub collection: Collection,
    pub tags: Vec<Tag>,
}

impl Subject {
    /// Localized name when present, romaji otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name_cn.is_empty() {
            &self.name
        } else {
            &self.name_cn
        }
    }

    /// Card shape shared with the airing calendar.
    #[must_use]
    pub fn to_calendar_item(&self) -> CalendarItem {
        CalendarItem {
            id: self.id,
            url: format!("https://bgm.tv/subject/{}", self.id),
            subject_type: ANIME_SUBJECT_TYPE,
            name: self.name.clone(),
            name_cn: self.name_cn.clone(),
            summary: self.summary.clone(),
            air_date: self
                .air_date
                .clone()
                .or_else(|| self.date.clone())
                .unwrap_or_default(),
            air_weekday: self.air_weekday.unwrap_or_default(),
            rating: self.rating.clone(),
            rank: self.rank.unwrap_or_default(),
            images: self.images.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarItem {
    pub id: SubjectId,
    pub url: String,
    #[serde(rename = "type")]
    pub subject_type: u8,
    pub name: String,
    pub name_cn: String,
    pub summary: String,
    pub air_date: String,
    pub air_weekday: u8,
    pub rating: Rating,
    pub rank: u32,
    pub images: Images,
}

impl CalendarItem {
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name_cn.is_empty() {
            &self.name
        } else {
            &self.name_cn
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weekday {
    pub en: String,
    pub cn: String,
    pub ja: String,
    pub id: u8,
}

/// One column of the airing calendar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarDay {
    pub weekday: Weekday,
    pub items: Vec<CalendarItem>,
}
