use thiserror::Error;

use crate::model::{ApiSettingsError, AttemptError, CourseDataError, EnrollmentError, QuizError};

/// Any failure raised by the domain layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    CourseData(#[from] CourseDataError),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Settings(#[from] ApiSettingsError),
}
