use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId};
use crate::model::result::QuizResult;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("progress must be within 0..=100, got {0}")]
    InvalidProgress(u8),

    #[error("completed_at is before enrolled_at")]
    InvalidTimeRange,

    #[error("quiz score for module {module_id} must be within 0..=100, got {score}")]
    InvalidScore { module_id: ModuleId, score: u8 },
}

/// A learner's standing in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    course_id: CourseId,
    progress: u8,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    best_scores: BTreeMap<ModuleId, u8>,
}

impl Enrollment {
    #[must_use]
    pub fn new(course_id: CourseId, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            course_id,
            progress: 0,
            enrolled_at,
            completed_at: None,
            best_scores: BTreeMap::new(),
        }
    }

    /// Rehydrate an enrollment from the collaborator.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError` if percentages are out of range or the
    /// completion timestamp precedes enrollment.
    pub fn from_persisted(
        course_id: CourseId,
        progress: u8,
        enrolled_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        best_scores: BTreeMap<ModuleId, u8>,
    ) -> Result<Self, EnrollmentError> {
        if progress > 100 {
            return Err(EnrollmentError::InvalidProgress(progress));
        }
        if completed_at.is_some_and(|at| at < enrolled_at) {
            return Err(EnrollmentError::InvalidTimeRange);
        }
        if let Some((module_id, score)) = best_scores.iter().find(|(_, score)| **score > 100) {
            return Err(EnrollmentError::InvalidScore {
                module_id: *module_id,
                score: *score,
            });
        }

        Ok(Self {
            course_id,
            progress,
            enrolled_at,
            completed_at,
            best_scores,
        })
    }

    /// Store the latest course percentage.
    ///
    /// Reaching 100 completes the enrollment; the first completion time is
    /// kept even if progress later drops. Returns true when this call
    /// completed the enrollment.
    pub fn record_progress(&mut self, percent: u8, now: DateTime<Utc>) -> bool {
        self.progress = percent.min(100);
        if self.progress == 100 && self.completed_at.is_none() {
            self.completed_at = Some(now);
            return true;
        }
        false
    }

    /// Keep the best score seen for a module's quiz. Returns true if it improved.
    pub fn record_quiz_result(&mut self, module_id: ModuleId, result: &QuizResult) -> bool {
        let score = result.score();
        match self.best_scores.get(&module_id) {
            Some(best) if *best >= score => false,
            _ => {
                self.best_scores.insert(module_id, score);
                true
            }
        }
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn best_score(&self, module_id: ModuleId) -> Option<u8> {
        self.best_scores.get(&module_id).copied()
    }

    #[must_use]
    pub fn best_scores(&self) -> &BTreeMap<ModuleId, u8> {
        &self.best_scores
    }
}
