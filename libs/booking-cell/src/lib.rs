pub mod models;
pub mod services;

pub use models::{AppointmentDraft, BookingMachine, BookingProgress, BookingState};
pub use services::booking::BookingService;
