pub mod monitor;
pub mod request;
pub mod submission;
