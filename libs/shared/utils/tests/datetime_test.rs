use assert_matches::assert_matches;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use shared_config::AppConfig;
use shared_utils::datetime::{format_canonical, parse_date_of_birth, DateTimeParser, ParsedWhen};

fn parser() -> DateTimeParser {
    DateTimeParser::new(&AppConfig::default())
}

// Wednesday, June 10th.
fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 10, 10, 0, 0).unwrap()
}

fn expect_exact(text: &str) -> DateTime<Utc> {
    match parser().parse(text, reference_now()) {
        ParsedWhen::Exact(dt) => dt,
        other => panic!("expected exact parse for {:?}, got {:?}", text, other),
    }
}

#[test]
fn canonical_output_parses_back_to_the_same_timestamp() {
    let dt = expect_exact("tomorrow at 3pm");
    let canonical = format_canonical(dt);
    assert_eq!(expect_exact(&canonical), dt);
}

#[test]
fn iso_date_without_time_defaults_to_morning() {
    let dt = expect_exact("2026-06-20");
    assert_eq!(format_canonical(dt), "2026-06-20 09:00");
}

#[test]
fn slashed_dates_prefer_month_day_when_valid() {
    assert_eq!(format_canonical(expect_exact("6/15")), "2026-06-15 09:00");
    // First number cannot be a month, so day/month is the only reading.
    assert_eq!(format_canonical(expect_exact("15/6")), "2026-06-15 09:00");
}

#[test]
fn slashed_date_with_clock_time() {
    assert_eq!(
        format_canonical(expect_exact("06/15/2026 2:30 pm")),
        "2026-06-15 14:30"
    );
}

#[test]
fn missing_year_rolls_forward_when_date_has_passed() {
    // June 5th is already behind the June 10th reference.
    assert_eq!(format_canonical(expect_exact("june 5")), "2027-06-05 09:00");
    assert_eq!(format_canonical(expect_exact("6/5")), "2027-06-05 09:00");
}

#[test]
fn relative_expressions_resolve_against_reference_now() {
    assert_eq!(format_canonical(expect_exact("today")), "2026-06-10 09:00");
    assert_eq!(
        format_canonical(expect_exact("tomorrow at 3pm")),
        "2026-06-11 15:00"
    );
    assert_eq!(
        format_canonical(expect_exact("next monday morning")),
        "2026-06-15 09:00"
    );
}

#[test]
fn bare_hour_uses_clinic_hours_rule() {
    // "at 2" reads as 2 PM; next Tuesday after Wed June 10 is June 16.
    assert_eq!(
        format_canonical(expect_exact("next tuesday at 2")),
        "2026-06-16 14:00"
    );
    assert_eq!(
        format_canonical(expect_exact("friday at 9")),
        "2026-06-12 09:00"
    );
}

#[test]
fn day_part_words_map_to_canonical_hours() {
    assert_eq!(
        format_canonical(expect_exact("june 20 in the afternoon")),
        "2026-06-20 14:00"
    );
    assert_eq!(
        format_canonical(expect_exact("june 20 evening")),
        "2026-06-20 18:00"
    );
}

#[test]
fn month_without_day_is_ambiguous() {
    assert_matches!(
        parser().parse("sometime in june", reference_now()),
        ParsedWhen::Ambiguous(_)
    );
}

#[test]
fn alternative_dates_are_ambiguous() {
    assert_matches!(
        parser().parse("june 15 or june 16", reference_now()),
        ParsedWhen::Ambiguous(_)
    );
}

#[test]
fn time_without_date_is_ambiguous() {
    assert_matches!(
        parser().parse("3pm", reference_now()),
        ParsedWhen::Ambiguous(_)
    );
}

#[test]
fn unrecognized_text_is_unparseable() {
    assert_matches!(
        parser().parse("whenever works for you", reference_now()),
        ParsedWhen::Unparseable
    );
    assert_matches!(parser().parse("", reference_now()), ParsedWhen::Unparseable);
}

#[test]
fn date_of_birth_accepts_common_formats() {
    let today = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
    let expected = NaiveDate::from_ymd_opt(1980, 1, 15).unwrap();
    assert_eq!(parse_date_of_birth("01/15/1980", today).unwrap(), expected);
    assert_eq!(parse_date_of_birth("1980-01-15", today).unwrap(), expected);
    assert_eq!(
        parse_date_of_birth("January 15, 1980", today).unwrap(),
        expected
    );
}

#[test]
fn date_of_birth_rejects_future_and_invalid_dates() {
    let today = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
    assert!(parse_date_of_birth("01/15/2030", today).is_err());
    assert!(parse_date_of_birth("02/30/1990", today).is_err());
    assert!(parse_date_of_birth("soon", today).is_err());
}
