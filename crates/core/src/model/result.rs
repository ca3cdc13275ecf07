use serde::Serialize;

use crate::model::ids::{OptionId, QuestionId};
use crate::model::quiz::QuizError;

/// Minimum score (inclusive) a learner needs to pass any quiz.
pub const PASSING_SCORE: u8 = 70;

const PASSED_FEEDBACK: &str = "Congratulations! You passed!";
const FAILED_FEEDBACK: &str = "Keep trying! You can do better!";

/// Scoring detail for one question of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub selected_option_id: Option<OptionId>,
    pub correct_option_id: OptionId,
    pub is_correct: bool,
}

impl QuestionOutcome {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected_option_id.is_some()
    }
}

/// Outcome of scoring one quiz attempt.
///
/// Counts, score and verdict are always derived from the per-question outcomes,
/// so a result can be rebuilt from persisted outcomes without drifting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    score: u8,
    total_questions: u32,
    correct_count: u32,
    passed: bool,
    passing_score: u8,
    questions: Vec<QuestionOutcome>,
}

impl QuizResult {
    /// Build a result from per-question outcomes in quiz order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when there are no outcomes.
    pub fn from_outcomes(questions: Vec<QuestionOutcome>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        let total = questions.len();
        let correct = questions.iter().filter(|q| q.is_correct).count();
        let score = crate::progress::rounded_percent(correct, total);

        Ok(Self {
            score,
            total_questions: u32::try_from(total).unwrap_or(u32::MAX),
            correct_count: u32::try_from(correct).unwrap_or(u32::MAX),
            passed: score >= PASSING_SCORE,
            passing_score: PASSING_SCORE,
            questions,
        })
    }

    /// Score in percent, 0..=100.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionOutcome] {
        &self.questions
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.questions.iter().filter(|q| !q.is_answered()).count()
    }

    /// Learner-facing message for the verdict.
    #[must_use]
    pub fn feedback(&self) -> &'static str {
        if self.passed {
            PASSED_FEEDBACK
        } else {
            FAILED_FEEDBACK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: u64, selected: Option<u64>, correct: bool) -> QuestionOutcome {
        QuestionOutcome {
            question_id: QuestionId::new(id),
            selected_option_id: selected.map(OptionId::new),
            correct_option_id: OptionId::new(1),
            is_correct: correct,
        }
    }

    #[test]
    fn result_derives_counts_from_outcomes() {
        let result = QuizResult::from_outcomes(vec![
            outcome(1, Some(1), true),
            outcome(2, Some(2), false),
            outcome(3, None, false),
        ])
        .unwrap();

        assert_eq!(result.total_questions(), 3);
        assert_eq!(result.correct_count(), 1);
        assert_eq!(result.score(), 33);
        assert_eq!(result.unanswered_count(), 1);
        assert!(!result.passed());
        assert_eq!(result.feedback(), FAILED_FEEDBACK);
    }

    #[test]
    fn empty_outcomes_are_rejected() {
        assert_eq!(QuizResult::from_outcomes(Vec::new()), Err(QuizError::Empty));
    }

    #[test]
    fn result_serializes_with_threshold() {
        let result = QuizResult::from_outcomes(vec![outcome(1, Some(1), true)]).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["score"], 100);
        assert_eq!(json["passing_score"], 70);
        assert_eq!(json["questions"][0]["question_id"], 1);
        assert_eq!(result.feedback(), PASSED_FEEDBACK);
    }
}
