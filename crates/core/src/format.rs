//! Display helpers shared by the API views and the terminal front end.

pub fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

/// `+150` / `-110`. Whole-number odds drop the fraction.
pub fn american_odds(odds: f64) -> String {
    let body = if odds.fract() == 0.0 {
        format!("{}", odds.abs() as i64)
    } else {
        format!("{}", odds.abs())
    };
    if odds > 0.0 {
        format!("+{body}")
    } else if odds < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

/// Probability in `[0, 1]` as a percentage with one decimal.
pub fn probability(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

pub fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// `(home-away)` using absolute spread values, e.g. `(2.5-2.5)`.
pub fn spread_pair(home: f64, away: f64) -> String {
    format!("({}-{})", trim_number(home.abs()), trim_number(away.abs()))
}

/// File name without directories and without the `.json` suffix.
pub fn file_label(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.replacen(".json", "", 1)
}

fn trim_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Splits a selection such as `"Lakers -4.5"` into the team and its spread.
///
/// Without a trailing number the whole input is the team and the spread is `None`.
pub fn parse_team_selection(input: &str) -> (String, Option<f64>) {
    let trimmed = input.trim();
    let tail_len = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .count();
    // The tail is ASCII, so its char count is its byte length.
    let mut start = trimmed.len() - tail_len;
    while trimmed[start..].starts_with('.') {
        start += 1;
    }

    let number = &trimmed[start..];
    if number.is_empty() || number.matches('.').count() > 1 {
        return (trimmed.to_string(), None);
    }

    let mut head = &trimmed[..start];
    let mut sign = 1.0;
    if let Some(rest) = head.strip_suffix('-') {
        sign = -1.0;
        head = rest;
    } else if let Some(rest) = head.strip_suffix('+') {
        head = rest;
    }

    let team = head.trim_end();
    if team.is_empty() {
        return (trimmed.to_string(), None);
    }
    match number.trim_end_matches('.').parse::<f64>() {
        Ok(v) => (team.to_string(), Some(sign * v)),
        Err(_) => (trimmed.to_string(), None),
    }
}
