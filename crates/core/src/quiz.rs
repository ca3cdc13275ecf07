//! Quiz evaluation.
//!
//! Everything here is a pure function of its arguments: scoring the same
//! questions and answers twice yields identical results.

use std::collections::HashSet;

use crate::model::{
    Answers, MalformedQuestion, OptionId, Question, QuestionId, QuestionOutcome, QuizError,
    QuizResult,
};

pub use crate::model::PASSING_SCORE;

/// Check every question and return the correct option id of each, in order.
///
/// # Errors
///
/// Returns `QuizError::Empty` for zero questions, or `QuizError::Malformed`
/// naming the first question with a repeated id, repeated option ids, or a
/// number of correct options other than one.
pub fn answer_key(questions: &[Question]) -> Result<Vec<OptionId>, QuizError> {
    if questions.is_empty() {
        return Err(QuizError::Empty);
    }

    let mut seen = HashSet::with_capacity(questions.len());
    questions
        .iter()
        .map(|question| {
            if !seen.insert(question.id) {
                return Err(QuizError::Malformed {
                    question_id: question.id,
                    reason: MalformedQuestion::DuplicateQuestion,
                });
            }
            question
                .correct_option()
                .map_err(|reason| QuizError::Malformed {
                    question_id: question.id,
                    reason,
                })
        })
        .collect()
}

/// Score an attempt.
///
/// Unanswered questions and options that do not belong to their question
/// count as incorrect; they are learner state, not contract violations.
///
/// # Errors
///
/// Returns `QuizError` if the question set is empty or malformed. Nothing is
/// scored in that case.
///
/// # Examples
///
/// ```
/// # use learn_core::model::{Answers, OptionId, Question, QuestionId, QuizOption};
/// # use learn_core::quiz::score_quiz;
/// let question = Question::new(
///     QuestionId::new(1),
///     "Capital of France?",
///     vec![
///         QuizOption::new(OptionId::new(1), "Paris", true),
///         QuizOption::new(OptionId::new(2), "Lyon", false),
///     ],
/// );
/// let answers = Answers::new().with_selection(QuestionId::new(1), OptionId::new(1));
/// let result = score_quiz(&[question], &answers)?;
/// assert_eq!(result.score(), 100);
/// assert!(result.passed());
/// # Ok::<(), learn_core::model::QuizError>(())
/// ```
pub fn score_quiz(questions: &[Question], answers: &Answers) -> Result<QuizResult, QuizError> {
    let key = answer_key(questions)?;

    let outcomes = questions
        .iter()
        .zip(key)
        .map(|(question, correct_option_id)| {
            let selected_option_id = answers.selected(question.id);
            let is_correct = selected_option_id
                .and_then(|id| question.option(id))
                .is_some_and(|option| option.id == correct_option_id);
            QuestionOutcome {
                question_id: question.id,
                selected_option_id,
                correct_option_id,
                is_correct,
            }
        })
        .collect();

    QuizResult::from_outcomes(outcomes)
}

/// Bind `question_id` to `option_id`, replacing any earlier selection.
///
/// Membership of the option in the question is not checked here.
#[must_use]
pub fn select_option(current: &Answers, question_id: QuestionId, option_id: OptionId) -> Answers {
    current.with_selection(question_id, option_id)
}

/// Empty answers for a fresh attempt.
#[must_use]
pub fn new_attempt() -> Answers {
    Answers::new()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
