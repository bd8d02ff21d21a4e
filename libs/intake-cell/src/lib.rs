pub mod models;
pub mod services;

pub use models::{IntakeReply, SessionSnapshot};
pub use services::engine::IntakeEngine;
pub use services::summary::IntakeSummary;
