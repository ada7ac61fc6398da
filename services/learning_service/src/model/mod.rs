pub mod course;
pub mod enrollment;
pub mod progress;
pub mod purchase;
pub mod user;

pub use course::{Chapter, Course, CourseValidationError, Lecture, Rating};
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use progress::{Progress, ProgressSummary};
pub use purchase::{Purchase, PurchaseStatus};
pub use user::User;

use thiserror::Error;

/// A status change the ledger state machines refuse.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Cannot move from {from} to {to}.")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub to: &'static str,
}

