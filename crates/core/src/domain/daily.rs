use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Folders the batch service publishes per date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DailyKind {
    #[serde(rename = "DailyMCS")]
    Simulations,
    #[serde(rename = "DailyOdds")]
    Odds,
    #[serde(rename = "DailyResults")]
    Results,
}

impl DailyKind {
    pub fn as_path(self) -> &'static str {
        match self {
            Self::Simulations => "DailyMCS",
            Self::Odds => "DailyOdds",
            Self::Results => "DailyResults",
        }
    }
}

impl fmt::Display for DailyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for DailyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dailymcs" | "mcs" | "simulations" => Ok(Self::Simulations),
            "dailyodds" | "odds" => Ok(Self::Odds),
            "dailyresults" | "results" => Ok(Self::Results),
            other => anyhow::bail!("unknown daily folder {other:?} (mcs|odds|results)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFile {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub data: serde_json::Value,
}

impl DailyFile {
    pub fn has_payload(&self) -> bool {
        !self.data.is_null()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyListing {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub files: Vec<DailyFile>,
}

impl DailyListing {
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            count: 0,
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub running: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrigger {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLogs {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub logs: Vec<String>,
}
