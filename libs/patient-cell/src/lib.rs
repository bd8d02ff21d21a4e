pub mod models;
pub mod services;

pub use models::{FieldUpdate, PatientDraft, PatientField, RegistrationState};
pub use services::extraction::extract_updates;
pub use services::registration::RegistrationMachine;
