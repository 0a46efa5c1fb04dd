pub mod daily;
pub mod game;
pub mod ledger;
pub mod prediction;
pub mod snapshot;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Game identifier as sent by the services. Some emit numbers, some strings; both normalize
/// to the same textual key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of arbitrary JSON. `null`, `false`, `0` and empty strings are not ids.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::new(s.as_str())),
            serde_json::Value::Number(n) => {
                if n.as_f64() == Some(0.0) {
                    None
                } else {
                    Some(Self(n.to_string()))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::String(s) => Ok(Self::new(s.as_str())),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "game id must be a string or number, got {other}"
            ))),
        }
    }
}

/// Reads an explicit `null` the same as a missing key. Pair with `#[serde(default)]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Record ids arrive as integers from some ledger versions and as strings from others.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_normalize_to_same_key() {
        let a: GameId = serde_json::from_value(json!(22400123)).unwrap();
        let b: GameId = serde_json::from_value(json!("22400123")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn from_json_treats_falsy_values_as_missing() {
        assert_eq!(GameId::from_json(&json!(null)), None);
        assert_eq!(GameId::from_json(&json!(0)), None);
        assert_eq!(GameId::from_json(&json!("")), None);
        assert_eq!(GameId::from_json(&json!(false)), None);
        assert_eq!(GameId::from_json(&json!(7)), Some(GameId::from("7")));
    }
}
