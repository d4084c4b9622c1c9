use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::SubjectId;

/// Episode category as encoded by Bangumi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum EpisodeType {
    Main,
    Special,
    Opening,
    Ending,
    Preview,
    Other,
    /// Codes the client does not know yet; kept so nothing is lost on re-serialize.
    Unknown(u8),
}

impl From<u8> for EpisodeType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Main,
            1 => Self::Special,
            2 => Self::Opening,
            3 => Self::Ending,
            4 => Self::Preview,
            6 => Self::Other,
            other => Self::Unknown(other),
        }
    }
}

impl From<EpisodeType> for u8 {
    fn from(kind: EpisodeType) -> Self {
        match kind {
            EpisodeType::Main => 0,
            EpisodeType::Special => 1,
            EpisodeType::Opening => 2,
            EpisodeType::Ending => 3,
            EpisodeType::Preview => 4,
            EpisodeType::Other => 6,
            EpisodeType::Unknown(code) => code,
        }
    }
}

impl Default for EpisodeType {
    fn default() -> Self {
        Self::Main
    }
}

impl fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "Main"),
            Self::Special => write!(f, "SP"),
            Self::Opening => write!(f, "OP"),
            Self::Ending => write!(f, "ED"),
            Self::Preview => write!(f, "PV"),
            Self::Other => write!(f, "Other"),
            Self::Unknown(code) => write!(f, "Type {code}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: EpisodeType,
    pub name: String,
    pub name_cn: String,
    pub sort: f64,
    pub ep: Option<f64>,
    pub airdate: Option<String>,
    pub duration: String,
    pub duration_seconds: Option<u32>,
    pub comment: u32,
    pub desc: String,
    pub disc: u32,
}

impl Episode {
    /// Key used by the availability map for this episode.
    #[must_use]
    pub fn availability_key(&self) -> String {
        let number = self.ep.unwrap_or(self.sort);
        if number.fract() == 0.0 {
            format!("{}", number as i64)
        } else {
            format!("{number}")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodePage {
    pub data: Vec<Episode>,
    pub total: u32,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeAvailability {
    pub available: bool,
    pub resource_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Availability {
    pub bangumi_id: SubjectId,
    pub episodes: BTreeMap<String, EpisodeAvailability>,
}

impl Availability {
    #[must_use]
    pub fn has_resource(&self) -> bool {
        self.episodes.values().any(|ep| ep.available)
    }

    #[must_use]
    pub fn for_episode(&self, episode: &Episode) -> Option<EpisodeAvailability> {
        self.episodes.get(&episode.availability_key()).copied()
    }
}
