use chrono::{Days, NaiveDate};
use std::cmp::Ordering;

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(NaiveDate::MAX)
}

/// Calendar quarter end for quarter index 1-4.
pub fn quarter_end(year: i32, quarter: u8) -> NaiveDate {
    last_day_of_month(year, u32::from(quarter.clamp(1, 4)) * 3)
}

pub fn year_end(year: i32) -> NaiveDate {
    last_day_of_month(year, 12)
}

/// Parses `YYYY-MM-DD`, tolerating a trailing time (`2024-03-31 00:00:00`)
/// and `YYYY/MM/DD`.
pub fn parse_end_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
        .ok()
}

/// Parses a numeric cell; blanks and non-numeric text are null.
pub fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Orders statement codes naturally: `BS.2` before `BS.13`, and
/// `BS.*` before `IS.*` before `Nt.*` before anything else.
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    code_sort_key(a).cmp(&code_sort_key(b))
}

fn code_sort_key(code: &str) -> (usize, String, u64, String) {
    let (prefix, rest) = code.split_once('.').unwrap_or((code, ""));
    let rank = match prefix {
        "BS" => 0,
        "IS" => 1,
        "Nt" => 2,
        "CA" => 3,
        _ => 4,
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let number = digits.parse().unwrap_or(u64::MAX);
    (rank, prefix.to_string(), number, rest.to_string())
}

pub fn is_statement_code(code: &str) -> bool {
    ["BS.", "IS.", "Nt."]
        .iter()
        .any(|prefix| code.starts_with(prefix))
}
