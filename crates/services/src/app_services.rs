use learn_core::model::ApiSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::course_service::CourseService;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::quiz_service::QuizService;

/// The services a front end needs, wired over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quizzes: QuizService,
    courses: CourseService,
    dashboard: DashboardService,
}

impl AppServices {
    /// Build services backed by the course REST API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be created.
    pub fn new_http(settings: ApiSettings, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::http(settings)?;
        Ok(Self::from_storage(clock, &storage))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self {
            quizzes: QuizService::new(
                clock,
                storage.quizzes.clone(),
                storage.attempts.clone(),
                storage.enrollments.clone(),
            ),
            courses: CourseService::new(
                clock,
                storage.courses.clone(),
                storage.enrollments.clone(),
            ),
            dashboard: DashboardService::new(clock, storage.enrollments.clone()),
        }
    }

    #[must_use]
    pub fn quizzes(&self) -> &QuizService {
        &self.quizzes
    }

    #[must_use]
    pub fn courses(&self) -> &CourseService {
        &self.courses
    }

    #[must_use]
    pub fn dashboard(&self) -> &DashboardService {
        &self.dashboard
    }
}
