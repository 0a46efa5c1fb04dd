use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

/// Resolves a slate date argument. `None` and `today` mean the current UTC date.
pub fn resolve_slate_date(arg: Option<&str>, now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    match arg.map(str::trim) {
        None | Some("") => Ok(now_utc.date_naive()),
        Some(s) if s.eq_ignore_ascii_case("today") => Ok(now_utc.date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD or today")),
    }
}
