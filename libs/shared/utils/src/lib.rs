pub mod contact;
pub mod datetime;
pub mod text;

pub use datetime::{format_canonical, format_display, parse_date_of_birth, DateTimeParser, ParsedWhen};
