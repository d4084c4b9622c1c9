use serde::{Deserialize, Serialize};

use super::SubjectId;
use crate::constants::limits;

/// A single release published by a subtitle group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub id: u64,
    pub title: String,
    pub resolution: Option<String>,
    pub subtitle_type: Option<String>,
    pub file_size: Option<String>,
    pub magnet_url: Option<String>,
    pub torrent_url: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleGroup {
    pub id: u64,
    pub name: String,
    pub resource_count: u32,
    pub resources: Vec<Release>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppliedFilters {
    pub resolution: Option<String>,
    pub subtitle_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePagination {
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceListing {
    pub bangumi_id: SubjectId,
    pub episode: Option<u32>,
    pub total_resources: u32,
    pub subtitle_groups: Vec<SubtitleGroup>,
    pub filters: AppliedFilters,
    pub pagination: ResourcePagination,
}

impl ResourceListing {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_resources == 0
    }

    pub fn releases(&self) -> impl Iterator<Item = (&SubtitleGroup, &Release)> {
        self.subtitle_groups
            .iter()
            .flat_map(|group| group.resources.iter().map(move |r| (group, r)))
    }
}

/// Filter and paging options for a resource listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceFilter {
    pub resolution: Option<String>,
    pub subtitle_type: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ResourceFilter {
    /// Requested page size. Zero means the default.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .filter(|&limit| limit != 0)
            .unwrap_or(limits::DEFAULT_RESOURCE_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Empty filter values are treated as "no filter".
    #[must_use]
    pub fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref().filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn subtitle_type(&self) -> Option<&str> {
        self.subtitle_type.as_deref().filter(|s| !s.is_empty())
    }
}
