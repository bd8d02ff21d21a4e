pub mod availability;
pub mod matching;
