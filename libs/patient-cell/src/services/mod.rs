pub mod extraction;
pub mod registration;
