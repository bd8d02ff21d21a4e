use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use shared_config::AppConfig;
use std::sync::OnceLock;
use tracing::debug;

/// Outcome of parsing a loosely-formatted date/time expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedWhen {
    Exact(DateTime<Utc>),
    /// More than one incompatible reading and no decisive rule; the caller
    /// must ask for clarification instead of guessing.
    Ambiguous(String),
    Unparseable,
}

/// Canonical timestamp text. Parsing this form returns the same timestamp.
pub fn format_canonical(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Human-facing form used on prompts and summaries,
/// e.g. "Monday, June 1, 2026 at 2:00 PM".
pub fn format_display(dt: DateTime<Utc>) -> String {
    dt.format("%A, %B %-d, %Y at %-I:%M %p").to_string()
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const DOB_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%B %d %Y", "%d %B %Y", "%b %d %Y", "%d %b %Y"];

const MONTHS: &[(&str, u32)] = &[
    ("january", 1), ("february", 2), ("march", 3), ("april", 4), ("may", 5), ("june", 6),
    ("july", 7), ("august", 8), ("september", 9), ("october", 10), ("november", 11),
    ("december", 12), ("jan", 1), ("feb", 2), ("mar", 3), ("apr", 4), ("jun", 6), ("jul", 7),
    ("aug", 8), ("sept", 9), ("sep", 9), ("oct", 10), ("nov", 11), ("dec", 12),
];

const WEEKDAYS: &[(&str, u32)] = &[
    ("monday", 0), ("mon", 0), ("tuesday", 1), ("tues", 1), ("tue", 1), ("wednesday", 2),
    ("wed", 2), ("thursday", 3), ("thurs", 3), ("thur", 3), ("thu", 3), ("friday", 4),
    ("fri", 4), ("saturday", 5), ("sat", 5), ("sunday", 6), ("sun", 6),
];

// Tokens that carry no date information and may be left over once the time
// fragment has been cut out ("tomorrow in the morning").
const FILLER_TOKENS: &[&str] = &["on", "in", "the", "at", "this", "a", "of"];

fn at_clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bat\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?").unwrap()
    })
}

fn colon_clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2}):(\d{2})\s*(am|pm|a\.m\.|p\.m\.)?").unwrap())
}

fn meridiem_clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})\s*(am|pm|a\.m\.|p\.m\.)").unwrap())
}

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})(?:st|nd|rd|th)\b").unwrap())
}

fn slash_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{2,4}))?$").unwrap())
}

enum DateFragment {
    Date(NaiveDate),
    Ambiguous(String),
    NoMatch,
}

/// Converts heterogeneous date/time text into a canonical UTC timestamp
/// relative to a caller-supplied reference instant. All clinic wall-clock
/// times are treated as UTC, matching the reference slot data.
pub struct DateTimeParser {
    morning: NaiveTime,
    afternoon: NaiveTime,
    evening: NaiveTime,
}

impl DateTimeParser {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            morning: hour_time(config.morning_hour),
            afternoon: hour_time(config.afternoon_hour),
            evening: hour_time(config.evening_hour),
        }
    }

    pub fn parse(&self, text: &str, reference_now: DateTime<Utc>) -> ParsedWhen {
        let raw = text.trim();
        if raw.is_empty() {
            return ParsedWhen::Unparseable;
        }

        // Canonical and ISO numeric forms take priority.
        for fmt in DATETIME_FORMATS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return ParsedWhen::Exact(Utc.from_utc_datetime(&ndt));
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return ParsedWhen::Exact(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return ParsedWhen::Exact(Utc.from_utc_datetime(&date.and_time(self.morning)));
        }

        let lowered = raw.to_lowercase();

        // Two alternative readings joined by "or" cannot be resolved here.
        if let Some((left, right)) = lowered.split_once(" or ") {
            let both_parse = matches!(self.parse(left, reference_now), ParsedWhen::Exact(_))
                && matches!(self.parse(right, reference_now), ParsedWhen::Exact(_));
            if both_parse {
                return ParsedWhen::Ambiguous("more than one date was mentioned".to_string());
            }
        }

        let (clock, date_text) = match self.extract_time(&lowered) {
            Ok(parts) => parts,
            Err(()) => return ParsedWhen::Unparseable,
        };

        let date_part = date_text.trim();
        if date_part.is_empty() {
            return if clock.is_some() {
                ParsedWhen::Ambiguous("a time was given without a date".to_string())
            } else {
                ParsedWhen::Unparseable
            };
        }

        let date = match self.parse_date_fragment(date_part, reference_now) {
            DateFragment::Date(d) => d,
            DateFragment::Ambiguous(reason) => return ParsedWhen::Ambiguous(reason),
            DateFragment::NoMatch => {
                debug!("no date pattern matched: {:?}", raw);
                return ParsedWhen::Unparseable;
            }
        };

        // A date with no resolvable time defaults to the morning hour.
        let time = clock.unwrap_or(self.morning);
        ParsedWhen::Exact(Utc.from_utc_datetime(&date.and_time(time)))
    }

    /// Cut the time-of-day fragment out of the text, returning the resolved
    /// clock time (if any) and the remaining date text. Err on an impossible
    /// clock reading such as "at 26".
    fn extract_time(&self, text: &str) -> Result<(Option<NaiveTime>, String), ()> {
        let mut remainder = text.to_string();
        let mut clock: Option<NaiveTime> = None;

        for re in [at_clock_re(), colon_clock_re(), meridiem_clock_re()] {
            if let Some(caps) = re.captures(&remainder) {
                let hour: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).ok_or(())?;
                let minute: u32 = match caps.get(2).filter(|m| m.as_str().chars().all(|c| c.is_ascii_digit())) {
                    Some(m) => m.as_str().parse().map_err(|_| ())?,
                    None => 0,
                };
                // The meridiem group index differs between the three patterns.
                let meridiem = caps
                    .iter()
                    .skip(2)
                    .flatten()
                    .map(|m| m.as_str())
                    .find(|s| s.starts_with('a') || s.starts_with('p'));
                clock = Some(resolve_clock(hour, minute, meridiem).ok_or(())?);
                let span = caps.get(0).map(|m| m.range()).ok_or(())?;
                remainder.replace_range(span, " ");
                break;
            }
        }

        // Day-part words; an explicit clock wins when both appear.
        let day_parts = [
            ("morning", self.morning),
            ("afternoon", self.afternoon),
            ("evening", self.evening),
            ("tonight", self.evening),
            ("midday", NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)),
            ("noon", NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)),
        ];
        for (word, t) in day_parts {
            if let Some(pos) = remainder.find(word) {
                remainder.replace_range(pos..pos + word.len(), " ");
                if clock.is_none() {
                    clock = Some(t);
                }
            }
        }

        Ok((clock, remainder))
    }

    fn parse_date_fragment(&self, text: &str, reference_now: DateTime<Utc>) -> DateFragment {
        let today = reference_now.date_naive();
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| c == ',' || c == '.').to_string())
            .filter(|t| !t.is_empty() && !FILLER_TOKENS.contains(&t.as_str()))
            .collect();
        if tokens.is_empty() {
            return DateFragment::NoMatch;
        }
        let joined = tokens.join(" ");

        match joined.as_str() {
            "today" => return DateFragment::Date(today),
            "tomorrow" => return DateFragment::Date(today + Duration::days(1)),
            "day after tomorrow" => return DateFragment::Date(today + Duration::days(2)),
            _ => {}
        }

        // "[next] <weekday>": the next strictly future occurrence.
        let weekday_token = match tokens.as_slice() {
            [one] => Some(one.as_str()),
            [first, second] if first == "next" => Some(second.as_str()),
            _ => None,
        };
        if let Some(name) = weekday_token {
            if let Some(&(_, target)) = WEEKDAYS.iter().find(|(w, _)| *w == name) {
                let current = today.weekday().num_days_from_monday();
                let mut ahead = (target + 7 - current) % 7;
                if ahead == 0 {
                    ahead = 7;
                }
                return DateFragment::Date(today + Duration::days(ahead as i64));
            }
        }

        // Slashed numeric dates: month/day preferred when the first number
        // can be a month, otherwise day/month is the only valid reading.
        if let Some(caps) = slash_date_re().captures(&joined) {
            let first: u32 = match caps[1].parse() {
                Ok(v) => v,
                Err(_) => return DateFragment::NoMatch,
            };
            let second: u32 = match caps[2].parse() {
                Ok(v) => v,
                Err(_) => return DateFragment::NoMatch,
            };
            let (month, day) = if first <= 12 {
                (first, second)
            } else if second <= 12 {
                (second, first)
            } else {
                return DateFragment::NoMatch;
            };
            let year = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());
            return match year {
                Some(y) => {
                    let y = if y < 100 { 2000 + y } else { y };
                    match NaiveDate::from_ymd_opt(y, month, day) {
                        Some(d) => DateFragment::Date(d),
                        None => DateFragment::NoMatch,
                    }
                }
                None => match infer_year(month, day, today) {
                    Some(d) => DateFragment::Date(d),
                    None => DateFragment::NoMatch,
                },
            };
        }

        // Month-name dates: "june 5", "5 june 2027", "june 5th".
        let month = tokens.iter().find_map(|t| {
            MONTHS.iter().find(|(name, _)| name == t).map(|&(_, num)| num)
        });
        if let Some(month) = month {
            let mut day = None;
            let mut year = None;
            for token in &tokens {
                let stripped = token
                    .trim_end_matches("st")
                    .trim_end_matches("nd")
                    .trim_end_matches("rd")
                    .trim_end_matches("th");
                if let Ok(value) = stripped.parse::<u32>() {
                    if token.len() >= 4 && value >= 1000 {
                        year = Some(value as i32);
                    } else if (1..=31).contains(&value) && day.is_none() {
                        day = Some(value);
                    }
                }
            }
            let day = match day {
                Some(d) => d,
                None => {
                    return DateFragment::Ambiguous(
                        "no day of the month was given".to_string(),
                    )
                }
            };
            return match year {
                Some(y) => match NaiveDate::from_ymd_opt(y, month, day) {
                    Some(d) => DateFragment::Date(d),
                    None => DateFragment::NoMatch,
                },
                None => match infer_year(month, day, today) {
                    Some(d) => DateFragment::Date(d),
                    None => DateFragment::NoMatch,
                },
            };
        }

        DateFragment::NoMatch
    }
}

/// Missing year: assume the current one, rolling forward when the date has
/// already passed.
fn infer_year(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if candidate < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(candidate)
    }
}

/// Clinic-hours reading of a bare clock hour: 1-7 means PM, 8-11 means AM,
/// 12 is noon. A bare hour always resolves rather than falling to Ambiguous.
fn resolve_clock(hour: u32, minute: u32, meridiem: Option<&str>) -> Option<NaiveTime> {
    if minute > 59 {
        return None;
    }
    let hour = match meridiem {
        Some(m) if m.starts_with('p') => match hour {
            12 => 12,
            1..=11 => hour + 12,
            _ => return None,
        },
        Some(_) => match hour {
            12 => 0,
            1..=11 => hour,
            _ => return None,
        },
        None => match hour {
            1..=7 => hour + 12,
            0 | 8..=23 => hour,
            _ => return None,
        },
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn hour_time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse a date of birth, rejecting invalid calendar dates and dates in the
/// future relative to `today`.
pub fn parse_date_of_birth(text: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let cleaned = text.trim();
    let without_commas = cleaned.replace(',', "");
    // "June 5th 1990" -> "June 5 1990".
    let without_ordinals = ordinal_re().replace_all(&without_commas, "$1").into_owned();
    for fmt in DOB_FORMATS {
        for candidate in [cleaned, without_commas.as_str(), without_ordinals.as_str()] {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, fmt) {
                if date > today {
                    return Err("date of birth cannot be in the future".to_string());
                }
                if date.year() < 1900 {
                    return Err("date of birth year looks implausible".to_string());
                }
                return Ok(date);
            }
        }
    }
    Err(format!("could not understand {:?} as a date of birth", cleaned))
}
