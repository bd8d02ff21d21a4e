pub mod models;
pub mod services;

pub use models::SpecialtyMatch;
pub use services::matching::SpecialtyMatcher;
