#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod dashboard_service;
pub mod error;
pub mod quiz_service;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use course_service::{CourseOutline, CourseService, LessonCompletion};
pub use dashboard_service::{Dashboard, DashboardService};
pub use error::{AppServicesError, CourseServiceError, DashboardError, QuizServiceError};
pub use quiz_service::{QuizService, QuizSubmission};
