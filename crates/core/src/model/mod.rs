mod api_settings;
mod attempt;
mod course;
mod enrollment;
mod ids;
mod quiz;
mod result;

pub use ids::{AttemptId, CourseId, LessonId, ModuleId, OptionId, ParseIdError, QuestionId};

pub use api_settings::{ApiSettings, ApiSettingsDraft, ApiSettingsError, DEFAULT_TIMEOUT_SECS};
pub use attempt::{AttemptError, AttemptPhase, Answers, QuizAttempt};
pub use course::{CourseDataError, Lesson, LessonKind, Module};
pub use enrollment::{Enrollment, EnrollmentError};
pub use quiz::{MalformedQuestion, Question, Quiz, QuizError, QuizOption};
pub use result::{PASSING_SCORE, QuestionOutcome, QuizResult};
