pub mod models;
pub mod services;

pub use models::{DoctorMatchOutcome, SlotResolution};
pub use services::availability::AvailabilityService;
pub use services::matching::DoctorMatcher;
