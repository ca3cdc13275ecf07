use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use learn_core::model::{CourseId, Enrollment, LessonId, Module, ModuleId};
use learn_core::progress::{
    CourseProgress, LessonRef, course_report, mark_lesson_completed, next_lesson,
    remaining_minutes, resolve_lock_state, total_minutes,
};
use storage::repository::{CourseRepository, EnrollmentRepository};

use crate::Clock;
use crate::error::CourseServiceError;

/// Everything a course page needs, derived from one snapshot of the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseOutline {
    pub course_id: CourseId,
    /// Modules with lock flags resolved.
    pub modules: Vec<Module>,
    pub progress: CourseProgress,
    pub next_lesson: Option<LessonRef>,
    pub total_minutes: u64,
    pub remaining_minutes: u64,
}

impl CourseOutline {
    /// Derive an outline from raw modules. Incoming lock flags are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::CourseData` if the outline is malformed.
    pub fn build(course_id: CourseId, modules: &[Module]) -> Result<Self, CourseServiceError> {
        let modules = resolve_lock_state(modules)?;
        Ok(Self {
            course_id,
            progress: course_report(&modules)?,
            next_lesson: next_lesson(&modules)?,
            total_minutes: total_minutes(&modules)?,
            remaining_minutes: remaining_minutes(&modules)?,
            modules,
        })
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.progress.percent
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }
}

/// Result of completing a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonCompletion {
    pub outline: CourseOutline,
    /// `None` when the learner is not enrolled; progress is then not recorded.
    pub enrollment: Option<Enrollment>,
    /// True when this completion finished the course.
    pub course_completed: bool,
}

#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
        }
    }

    /// Load and resolve a course outline.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course cannot be fetched
    /// or `CourseServiceError::CourseData` if it is malformed.
    pub async fn outline(&self, course_id: CourseId) -> Result<CourseOutline, CourseServiceError> {
        let modules = self.courses.get_modules(course_id).await?;
        let outline = CourseOutline::build(course_id, &modules)?;
        debug!(%course_id, percent = outline.percent(), "course outline resolved");
        Ok(outline)
    }

    /// Enroll the learner, or return the existing enrollment unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError` if the course is missing or malformed, or
    /// the enrollment cannot be stored.
    pub async fn enroll(&self, course_id: CourseId) -> Result<Enrollment, CourseServiceError> {
        if let Some(existing) = self.enrollments.get_enrollment(course_id).await? {
            return Ok(existing);
        }

        let outline = self.outline(course_id).await?;
        let now = self.clock.now();
        let mut enrollment = Enrollment::new(course_id, now);
        enrollment.record_progress(outline.percent(), now);
        self.enrollments.upsert_enrollment(&enrollment).await?;
        info!(%course_id, progress = enrollment.progress(), "enrolled");
        Ok(enrollment)
    }

    /// Mark a lesson completed and refresh the enrollment's progress.
    ///
    /// Locks are advisory: completing a lesson in a locked module is logged
    /// and allowed.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::CourseData` for an unknown module or lesson
    /// (nothing is persisted), or `CourseServiceError::Storage` on I/O failures.
    pub async fn complete_lesson(
        &self,
        course_id: CourseId,
        module_id: ModuleId,
        lesson_id: LessonId,
    ) -> Result<LessonCompletion, CourseServiceError> {
        let modules = self.courses.get_modules(course_id).await?;
        let updated = mark_lesson_completed(&modules, module_id, lesson_id)?;

        let resolved = resolve_lock_state(&modules)?;
        if resolved.iter().any(|m| m.id == module_id && m.locked) {
            warn!(%course_id, %module_id, %lesson_id, "completing a lesson in a locked module");
        }

        self.courses
            .set_lesson_completed(course_id, module_id, lesson_id)
            .await?;
        let outline = CourseOutline::build(course_id, &updated)?;

        let mut course_completed = false;
        let enrollment = match self.enrollments.get_enrollment(course_id).await? {
            Some(mut enrollment) => {
                course_completed = enrollment.record_progress(outline.percent(), self.clock.now());
                self.enrollments.upsert_enrollment(&enrollment).await?;
                Some(enrollment)
            }
            None => {
                debug!(%course_id, "lesson completed without an enrollment");
                None
            }
        };

        info!(
            %course_id,
            %module_id,
            %lesson_id,
            percent = outline.percent(),
            course_completed,
            "lesson completed"
        );
        Ok(LessonCompletion {
            outline,
            enrollment,
            course_completed,
        })
    }
}
