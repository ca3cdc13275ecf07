use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use learn_core::model::{
    AttemptId, CourseId, Enrollment, ModuleId, OptionId, QuestionId, Quiz, QuizAttempt,
    QuizResult,
};
use storage::repository::{
    AttemptRepository, EnrollmentRepository, QuizAttemptRecord, QuizRepository, StorageError,
};

use crate::Clock;
use crate::error::QuizServiceError;

/// Outcome of submitting an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSubmission {
    pub attempt_id: AttemptId,
    pub result: QuizResult,
    /// True when this attempt raised the learner's best score for the module.
    pub improved_best: bool,
    pub enrollment: Enrollment,
}

/// Runs quiz attempts against the API collaborator.
///
/// Scoring itself is delegated to the pure evaluator; this service only loads
/// inputs and persists outputs.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            attempts,
            enrollments,
        }
    }

    /// Fetch and validate a module's quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if the definition cannot be scored,
    /// or `QuizServiceError::Storage` if it cannot be fetched.
    pub async fn load_quiz(&self, module_id: ModuleId) -> Result<Quiz, QuizServiceError> {
        let questions = self.quizzes.get_questions(module_id).await?;
        let quiz = Quiz::new(module_id, questions).inspect_err(|e| {
            warn!(%module_id, error = %e, "quiz definition rejected");
        })?;
        debug!(%module_id, questions = quiz.len(), "quiz loaded");
        Ok(quiz)
    }

    /// A fresh attempt. Retakes call this again rather than reusing an attempt.
    #[must_use]
    pub fn start_attempt(&self) -> QuizAttempt {
        QuizAttempt::new()
    }

    /// Record a selection at the service clock's current time.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Attempt` if the attempt is already submitted.
    pub fn select(
        &self,
        attempt: &mut QuizAttempt,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<(), QuizServiceError> {
        attempt.select(question_id, option_id, self.clock.now())?;
        Ok(())
    }

    /// Score an attempt, persist it and update the enrollment's best score.
    ///
    /// The enrollment is checked before scoring, so an unenrolled learner's
    /// attempt stays open.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotEnrolled` without an enrollment,
    /// `QuizServiceError::Attempt` if the attempt is closed, or
    /// `QuizServiceError::Storage` if persistence fails. In the last case the
    /// attempt is already submitted and `finalize` can be retried.
    pub async fn submit(
        &self,
        course_id: CourseId,
        quiz: &Quiz,
        attempt: &mut QuizAttempt,
    ) -> Result<QuizSubmission, QuizServiceError> {
        if self.enrollments.get_enrollment(course_id).await?.is_none() {
            return Err(QuizServiceError::NotEnrolled(course_id));
        }

        let (score, passed) = {
            let result = attempt.submit(quiz.questions(), self.clock.now())?;
            (result.score(), result.passed())
        };
        info!(
            module_id = %quiz.module_id(),
            attempt_id = %attempt.id(),
            score,
            passed,
            "quiz attempt scored"
        );

        self.finalize(course_id, quiz, attempt).await
    }

    /// Persist a submitted attempt and fold its score into the enrollment.
    ///
    /// Safe to call again after a failed persistence step: an attempt that was
    /// already stored is not stored twice.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotSubmitted` for an open attempt,
    /// `QuizServiceError::NotEnrolled` without an enrollment, or storage errors.
    pub async fn finalize(
        &self,
        course_id: CourseId,
        quiz: &Quiz,
        attempt: &QuizAttempt,
    ) -> Result<QuizSubmission, QuizServiceError> {
        let record = QuizAttemptRecord::from_attempt(course_id, quiz.module_id(), attempt)
            .ok_or(QuizServiceError::NotSubmitted)?;

        match self.attempts.append_attempt(&record).await {
            Ok(()) | Err(StorageError::Conflict) => {}
            Err(e) => return Err(e.into()),
        }

        let mut enrollment = self
            .enrollments
            .get_enrollment(course_id)
            .await?
            .ok_or(QuizServiceError::NotEnrolled(course_id))?;
        let improved_best = enrollment.record_quiz_result(quiz.module_id(), &record.result);
        if improved_best {
            self.enrollments.upsert_enrollment(&enrollment).await?;
            debug!(%course_id, module_id = %quiz.module_id(), score = record.result.score(), "best score updated");
        }

        Ok(QuizSubmission {
            attempt_id: record.attempt_id,
            result: record.result,
            improved_best,
            enrollment,
        })
    }

    /// Stored attempts for a module, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failures.
    pub async fn history(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizAttemptRecord>, QuizServiceError> {
        let mut records = self.attempts.list_attempts(module_id).await?;
        records.sort_by_key(|r| r.submitted_at);
        Ok(records)
    }

    /// The highest-scoring stored attempt; the earliest wins ties.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failures.
    pub async fn best_attempt(
        &self,
        module_id: ModuleId,
    ) -> Result<Option<QuizAttemptRecord>, QuizServiceError> {
        let history = self.history(module_id).await?;
        Ok(history.into_iter().fold(None, |best, record| match best {
            Some(b) if b.result.score() >= record.result.score() => Some(b),
            _ => Some(record),
        }))
    }
}
