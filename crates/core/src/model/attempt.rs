use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{AttemptId, OptionId, QuestionId};
use crate::model::quiz::{Question, QuizError};
use crate::model::result::QuizResult;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt {0} was already submitted")]
    AlreadySubmitted(AttemptId),

    #[error(transparent)]
    Quiz(#[from] QuizError),
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Learner selections for one attempt: at most one option per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<QuestionId, OptionId>);

impl Answers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `question_id` bound to `option_id`, replacing any prior choice.
    #[must_use]
    pub fn with_selection(&self, question_id: QuestionId, option_id: OptionId) -> Self {
        let mut next = self.clone();
        next.0.insert(question_id, option_id);
        next
    }

    #[must_use]
    pub fn selected(&self, question_id: QuestionId) -> Option<OptionId> {
        self.0.get(&question_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, OptionId)> + '_ {
        self.0.iter().map(|(q, o)| (*q, *o))
    }
}

impl FromIterator<(QuestionId, OptionId)> for Answers {
    fn from_iter<I: IntoIterator<Item = (QuestionId, OptionId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// Lifecycle of a single attempt. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    NotStarted,
    InProgress,
    Submitted,
}

/// One learner's pass through a quiz, from first selection to submission.
///
/// Retaking a quiz means building a fresh attempt; a submitted attempt never
/// goes back to `InProgress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    id: AttemptId,
    phase: AttemptPhase,
    answers: Answers,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
    result: Option<QuizResult>,
}

impl Default for QuizAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizAttempt {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AttemptId::random(),
            phase: AttemptPhase::NotStarted,
            answers: Answers::new(),
            started_at: None,
            submitted_at: None,
            result: None,
        }
    }

    /// Record a selection, moving the attempt into `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AlreadySubmitted` once the attempt is submitted.
    pub fn select(
        &mut self,
        question_id: QuestionId,
        option_id: OptionId,
        now: DateTime<Utc>,
    ) -> Result<(), AttemptError> {
        if self.phase == AttemptPhase::Submitted {
            return Err(AttemptError::AlreadySubmitted(self.id));
        }
        self.answers = crate::quiz::select_option(&self.answers, question_id, option_id);
        self.started_at.get_or_insert(now);
        self.phase = AttemptPhase::InProgress;
        Ok(())
    }

    /// Score the attempt and close it.
    ///
    /// On error the attempt keeps its phase and answers.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AlreadySubmitted` on a second submission and
    /// `AttemptError::Quiz` if the questions cannot be scored.
    pub fn submit(
        &mut self,
        questions: &[Question],
        now: DateTime<Utc>,
    ) -> Result<&QuizResult, AttemptError> {
        if self.phase == AttemptPhase::Submitted {
            return Err(AttemptError::AlreadySubmitted(self.id));
        }
        let result = crate::quiz::score_quiz(questions, &self.answers)?;

        self.started_at.get_or_insert(now);
        self.submitted_at = Some(now);
        self.phase = AttemptPhase::Submitted;
        Ok(&*self.result.insert(result))
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
