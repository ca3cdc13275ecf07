use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{ModuleId, OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Why a single question cannot be scored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedQuestion {
    #[error("no option is marked correct")]
    NoCorrectOption,

    #[error("{count} options are marked correct")]
    MultipleCorrectOptions { count: usize },

    #[error("option {0} appears more than once")]
    DuplicateOption(OptionId),

    #[error("question id appears more than once in the quiz")]
    DuplicateQuestion,
}

/// Errors raised while validating or scoring a quiz definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("question {question_id} is malformed: {reason}")]
    Malformed {
        question_id: QuestionId,
        reason: MalformedQuestion,
    },
}

impl QuizError {
    /// The offending question, when the error concerns a single question.
    #[must_use]
    pub fn question_id(&self) -> Option<QuestionId> {
        match self {
            QuizError::Empty => None,
            QuizError::Malformed { question_id, .. } => Some(*question_id),
        }
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
    pub is_correct: bool,
}

impl QuizOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct,
        }
    }
}

/// A single-choice question with its ordered options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<QuizOption>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>, options: Vec<QuizOption>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options,
        }
    }

    /// Returns the id of the single correct option.
    ///
    /// # Errors
    ///
    /// Returns `MalformedQuestion` if option ids repeat or if the number of
    /// correct options is not exactly one.
    pub fn correct_option(&self) -> Result<OptionId, MalformedQuestion> {
        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if !seen.insert(option.id) {
                return Err(MalformedQuestion::DuplicateOption(option.id));
            }
        }

        let mut correct = self.options.iter().filter(|o| o.is_correct);
        match (correct.next(), correct.count()) {
            (None, _) => Err(MalformedQuestion::NoCorrectOption),
            (Some(option), 0) => Ok(option.id),
            (Some(_), rest) => Err(MalformedQuestion::MultipleCorrectOptions { count: rest + 1 }),
        }
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A validated quiz attached to a module.
///
/// Construction checks every question up front, so a `Quiz` can always be scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    module_id: ModuleId,
    questions: Vec<Question>,
}

impl Quiz {
    /// Validate a module's questions into a quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` for zero questions and `QuizError::Malformed`
    /// for the first question that breaks the single-correct-option contract.
    pub fn new(module_id: ModuleId, questions: Vec<Question>) -> Result<Self, QuizError> {
        crate::quiz::answer_key(&questions)?;
        Ok(Self {
            module_id,
            questions,
        })
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
