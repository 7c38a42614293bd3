//! Tuning constants for the submission-and-confirmation pipeline.

mod submission;
pub use submission::*;

mod confirmation;
pub use confirmation::*;
