use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learn_core::model::{
    Answers, AttemptId, CourseId, Enrollment, LessonId, Module, ModuleId, Question, QuizAttempt,
    QuizResult,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by collaborator adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("request rejected with status {status}")]
    Rejected { status: u16 },
}

/// Persisted shape of a submitted quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptRecord {
    pub attempt_id: AttemptId,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub answers: Answers,
    pub result: QuizResult,
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttemptRecord {
    /// Capture a submitted attempt. Returns `None` while the attempt is still open.
    #[must_use]
    pub fn from_attempt(
        course_id: CourseId,
        module_id: ModuleId,
        attempt: &QuizAttempt,
    ) -> Option<Self> {
        Some(Self {
            attempt_id: attempt.id(),
            course_id,
            module_id,
            answers: attempt.answers().clone(),
            result: attempt.result()?.clone(),
            submitted_at: attempt.submitted_at()?,
        })
    }
}

/// Read access to quiz definitions.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Fetch a module's questions in display order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module has no quiz, or other
    /// storage errors.
    async fn get_questions(&self, module_id: ModuleId) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a submitted attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt id was already stored.
    async fn append_attempt(&self, record: &QuizAttemptRecord) -> Result<(), StorageError>;

    /// List stored attempts for a module, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if attempts cannot be read.
    async fn list_attempts(&self, module_id: ModuleId)
    -> Result<Vec<QuizAttemptRecord>, StorageError>;
}

/// Course outlines and lesson completion.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Fetch the ordered modules of a course with current completion flags.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course is missing.
    async fn get_modules(&self, course_id: CourseId) -> Result<Vec<Module>, StorageError>;

    /// Record a lesson as completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course, module or lesson is missing.
    async fn set_lesson_completed(
        &self,
        course_id: CourseId,
        module_id: ModuleId,
        lesson_id: LessonId,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Fetch the learner's enrollment in a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_enrollment(&self, course_id: CourseId)
    -> Result<Option<Enrollment>, StorageError>;

    /// Create or replace an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollment cannot be stored.
    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// All of the learner's enrollments, ordered by course id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<ModuleId, Vec<Question>>>>,
    courses: Arc<Mutex<HashMap<CourseId, Vec<Module>>>>,
    attempts: Arc<Mutex<Vec<QuizAttemptRecord>>>,
    enrollments: Arc<Mutex<BTreeMap<CourseId, Enrollment>>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a module's quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn insert_questions(
        &self,
        module_id: ModuleId,
        questions: Vec<Question>,
    ) -> Result<(), StorageError> {
        self.questions
            .lock()
            .map_err(poisoned)?
            .insert(module_id, questions);
        Ok(())
    }

    /// Seed a course outline.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn insert_course(&self, course_id: CourseId, modules: Vec<Module>) -> Result<(), StorageError> {
        self.courses
            .lock()
            .map_err(poisoned)?
            .insert(course_id, modules);
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn get_questions(&self, module_id: ModuleId) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        guard.get(&module_id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, record: &QuizAttemptRecord) -> Result<(), StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        if guard.iter().any(|r| r.attempt_id == record.attempt_id) {
            return Err(StorageError::Conflict);
        }
        guard.push(record.clone());
        Ok(())
    }

    async fn list_attempts(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|r| r.module_id == module_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn get_modules(&self, course_id: CourseId) -> Result<Vec<Module>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        guard.get(&course_id).cloned().ok_or(StorageError::NotFound)
    }

    async fn set_lesson_completed(
        &self,
        course_id: CourseId,
        module_id: ModuleId,
        lesson_id: LessonId,
    ) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        let lesson = guard
            .get_mut(&course_id)
            .and_then(|modules| modules.iter_mut().find(|m| m.id == module_id))
            .and_then(|module| module.lessons.iter_mut().find(|l| l.id == lesson_id))
            .ok_or(StorageError::NotFound)?;
        lesson.completed = true;
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn get_enrollment(
        &self,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        Ok(guard.get(&course_id).cloned())
    }

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.enrollments.lock().map_err(poisoned)?;
        guard.insert(enrollment.course_id(), enrollment.clone());
        Ok(())
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}

/// Aggregates the collaborator repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one repository value across every collaborator role.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuizRepository
            + AttemptRepository
            + CourseRepository
            + EnrollmentRepository
            + Clone
            + 'static,
    {
        Self {
            quizzes: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            enrollments: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::{Lesson, LessonKind, OptionId, QuestionId, QuizOption};
    use learn_core::time::fixed_now;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            "Q",
            vec![
                QuizOption::new(OptionId::new(1), "a", true),
                QuizOption::new(OptionId::new(2), "b", false),
            ],
        )
    }

    fn submitted_attempt() -> QuizAttempt {
        let mut attempt = QuizAttempt::new();
        attempt
            .select(QuestionId::new(1), OptionId::new(1), fixed_now())
            .unwrap();
        attempt.submit(&[question(1)], fixed_now()).unwrap();
        attempt
    }

    #[tokio::test]
    async fn attempts_are_filtered_by_module_and_unique() {
        let repo = InMemoryRepository::new();
        let attempt = submitted_attempt();
        let record =
            QuizAttemptRecord::from_attempt(CourseId::new(1), ModuleId::new(2), &attempt).unwrap();

        repo.append_attempt(&record).await.unwrap();
        assert!(matches!(
            repo.append_attempt(&record).await,
            Err(StorageError::Conflict)
        ));

        assert_eq!(repo.list_attempts(ModuleId::new(2)).await.unwrap().len(), 1);
        assert!(repo.list_attempts(ModuleId::new(3)).await.unwrap().is_empty());
    }

    #[test]
    fn open_attempts_have_no_record() {
        let attempt = QuizAttempt::new();
        assert!(QuizAttemptRecord::from_attempt(CourseId::new(1), ModuleId::new(1), &attempt).is_none());
    }

    #[tokio::test]
    async fn completing_a_lesson_updates_the_stored_outline() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new(1);
        let module = Module::new(
            ModuleId::new(1),
            "Basics",
            vec![Lesson::new(LessonId::new(10), "Intro", LessonKind::Text, 5)],
        );
        repo.insert_course(course, vec![module]).unwrap();

        repo.set_lesson_completed(course, ModuleId::new(1), LessonId::new(10))
            .await
            .unwrap();
        let modules = repo.get_modules(course).await.unwrap();
        assert!(modules[0].lessons[0].completed);

        assert!(matches!(
            repo.set_lesson_completed(course, ModuleId::new(1), LessonId::new(11))
                .await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let storage = Storage::in_memory();
        assert!(matches!(
            storage.quizzes.get_questions(ModuleId::new(1)).await,
            Err(StorageError::NotFound)
        ));
        assert!(storage
            .enrollments
            .get_enrollment(CourseId::new(1))
            .await
            .unwrap()
            .is_none());
    }
}
