use crate::domain::daily::DailyFile;
use crate::domain::GameId;
use crate::format;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One simulation output file for one game, as published by the batch job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSnapshot {
    pub game_id: Option<GameId>,
    pub generated_at: Option<DateTime<Utc>>,
    pub file_name: String,
    pub payload: Value,
}

impl PredictionSnapshot {
    pub fn file_stamp(&self) -> Option<&str> {
        filename_stamp(&self.file_name)
    }
}

impl From<DailyFile> for PredictionSnapshot {
    fn from(file: DailyFile) -> Self {
        let game_id = file.data.get("game_id").and_then(GameId::from_json);
        let generated_at = file
            .data
            .get("generated_at")
            .and_then(Value::as_str)
            .and_then(parse_generated_at);
        Self {
            game_id,
            generated_at,
            file_name: file.name,
            payload: file.data,
        }
    }
}

/// Extracts the trailing `YYYYMMDD_HHMMSS` token from `..._YYYYMMDD_HHMMSS.json`.
///
/// The token is fixed-width and zero-padded, so string order is chronological order.
pub fn filename_stamp(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".json")?;
    let bytes = stem.as_bytes();
    if bytes.len() < 16 {
        return None;
    }
    let start = bytes.len() - 15;
    if bytes[start - 1] != b'_' {
        return None;
    }
    let well_formed = bytes[start..].iter().enumerate().all(|(i, b)| {
        if i == 8 {
            *b == b'_'
        } else {
            b.is_ascii_digit()
        }
    });
    well_formed.then(|| &stem[start..])
}

/// Lenient timestamp parsing. Zone-less values are read as UTC; garbage is `None`.
pub fn parse_generated_at(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WinProbabilities {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadLine {
    pub spread: f64,
    pub mcs_probability: Option<f64>,
}

/// View model for one game on the predictions page.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionCard {
    pub game_id: Option<GameId>,
    pub away_team: String,
    pub home_team: String,
    pub game_date: String,
    pub generated_at: Option<String>,
    pub win_probabilities: WinProbabilities,
    pub implied_probability: Value,
    pub home_spread: Option<SpreadLine>,
    pub away_spread: Option<SpreadLine>,
    pub spread_display: Option<String>,
    pub file_label: String,
}

impl PredictionCard {
    pub fn from_snapshot(snapshot: &PredictionSnapshot, requested_date: &str) -> Self {
        let data = &snapshot.payload;
        let text = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let probs = data.get("win_probabilities");
        let prob = |side: &str| {
            probs
                .and_then(|p| p.get(side))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };

        let comparison = data.get("spread_odds_comparison");
        let home_spread = comparison.and_then(|c| spread_line(c.get("home_team_spread")));
        let away_spread = comparison.and_then(|c| spread_line(c.get("away_team_spread")));
        let spread_display = match (home_spread, away_spread) {
            (Some(h), Some(a)) => Some(format::spread_pair(h.spread, a.spread)),
            _ => None,
        };

        Self {
            game_id: snapshot.game_id.clone(),
            away_team: text("away_team").unwrap_or_else(|| "Unknown".to_string()),
            home_team: text("home_team").unwrap_or_else(|| "Unknown".to_string()),
            game_date: text("game_date").unwrap_or_else(|| requested_date.to_string()),
            generated_at: text("generated_at"),
            win_probabilities: WinProbabilities {
                home: prob("home_team"),
                away: prob("away_team"),
            },
            implied_probability: data
                .get("implied_probability")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            home_spread,
            away_spread,
            spread_display,
            file_label: format::file_label(&snapshot.file_name),
        }
    }
}

fn spread_line(v: Option<&Value>) -> Option<SpreadLine> {
    let v = v.filter(|v| v.is_object())?;
    Some(SpreadLine {
        spread: v.get("spread").and_then(Value::as_f64).unwrap_or(0.0),
        mcs_probability: v.get("mcs_probability").and_then(Value::as_f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn stamp_requires_exact_trailing_token() {
        assert_eq!(
            filename_stamp("mcs_0022400001_20250101_080000_20250101_093015.json"),
            Some("20250101_093015")
        );
        assert_eq!(filename_stamp("x_20240101_120000.json"), Some("20240101_120000"));
        assert_eq!(filename_stamp("x_20240101_1200.json"), None);
        assert_eq!(filename_stamp("x20240101_120000.json"), None);
        assert_eq!(filename_stamp("x_20240101_120000.txt"), None);
        assert_eq!(filename_stamp("x_2024O101_120000.json"), None);
        assert_eq!(filename_stamp("_20240101_120000.json"), Some("20240101_120000"));
        assert_eq!(filename_stamp(".json"), None);
    }

    #[test]
    fn generated_at_accepts_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 15).unwrap();
        assert_eq!(parse_generated_at("2025-01-01T09:30:15Z"), Some(expected));
        assert_eq!(parse_generated_at("2025-01-01T04:30:15-05:00"), Some(expected));
        assert_eq!(parse_generated_at("2025-01-01T09:30:15"), Some(expected));
        assert_eq!(parse_generated_at("2025-01-01 09:30:15.250").map(|d| d.timestamp()), Some(expected.timestamp()));
        assert_eq!(
            parse_generated_at("2025-01-01"),
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_generated_at("yesterday"), None);
        assert_eq!(parse_generated_at(""), None);
    }

    #[test]
    fn snapshot_reads_id_and_timestamp_from_payload() {
        let snap = PredictionSnapshot::from(DailyFile {
            name: "g_20250101_093015.json".to_string(),
            data: json!({"game_id": 22400001, "generated_at": "not a date"}),
        });
        assert_eq!(snap.game_id, Some(GameId::from("22400001")));
        assert_eq!(snap.generated_at, None);
        assert_eq!(snap.file_stamp(), Some("20250101_093015"));
    }

    #[test]
    fn card_defaults_and_spread_display() {
        let snap = PredictionSnapshot::from(DailyFile {
            name: "DailyMCS/2025-01-01/lal_gsw_20250101_093015.json".to_string(),
            data: json!({
                "game_id": "0022400001",
                "home_team": "Lakers",
                "win_probabilities": {"home_team": 0.58, "away_team": 0.42},
                "spread_odds_comparison": {
                    "home_team_spread": {"spread": -2.5, "mcs_probability": 0.55},
                    "away_team_spread": {"spread": 2.5, "mcs_probability": 0.45}
                }
            }),
        });

        let card = PredictionCard::from_snapshot(&snap, "2025-01-01");
        assert_eq!(card.away_team, "Unknown");
        assert_eq!(card.home_team, "Lakers");
        assert_eq!(card.game_date, "2025-01-01");
        assert_eq!(card.win_probabilities.home, 0.58);
        assert_eq!(card.spread_display.as_deref(), Some("(2.5-2.5)"));
        assert_eq!(card.home_spread.unwrap().mcs_probability, Some(0.55));
        assert_eq!(card.file_label, "lal_gsw_20250101_093015");
    }
}
