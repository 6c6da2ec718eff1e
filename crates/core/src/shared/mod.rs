pub mod constants;
pub mod person_detection;
