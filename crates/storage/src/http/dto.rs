//! Wire shapes of the course API and their mapping onto domain values.

use chrono::{DateTime, Utc};
use learn_core::model::{
    Answers, AttemptId, CourseId, Enrollment, Lesson, LessonId, LessonKind, Module, ModuleId,
    OptionId, Question, QuestionId, QuestionOutcome, QuizOption, QuizResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::repository::{QuizAttemptRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Identifier as sent by the backend: a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    fn into_u64(self, field: &'static str) -> Result<u64, StorageError> {
        match self {
            WireId::Number(n) => Ok(n),
            WireId::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| StorageError::Serialization(format!("invalid {field}: {s:?}"))),
        }
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct OptionDto {
    id: WireId,
    option_text: String,
    #[serde(default)]
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    id: WireId,
    question: String,
    #[serde(default)]
    options: Vec<OptionDto>,
}

impl QuestionDto {
    pub(crate) fn into_question(self) -> Result<Question, StorageError> {
        let options = self
            .options
            .into_iter()
            .map(|o| {
                Ok(QuizOption::new(
                    OptionId::new(o.id.into_u64("option id")?),
                    o.option_text,
                    o.is_correct,
                ))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        Ok(Question::new(
            QuestionId::new(self.id.into_u64("question id")?),
            self.question,
            options,
        ))
    }
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct LessonDto {
    id: WireId,
    title: String,
    content_type: String,
    #[serde(default)]
    duration: i32,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleDto {
    id: WireId,
    title: String,
    #[serde(default)]
    lessons: Vec<LessonDto>,
    #[serde(default)]
    prerequisites: Vec<WireId>,
}

pub(crate) fn parse_lesson_kind(s: &str) -> Result<LessonKind, StorageError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "video" => Ok(LessonKind::Video),
        "quiz" => Ok(LessonKind::Quiz),
        "text" => Ok(LessonKind::Text),
        other => Err(StorageError::Serialization(format!(
            "invalid content_type: {other}"
        ))),
    }
}

impl ModuleDto {
    /// Incoming lock flags are dropped; lock state is always recomputed.
    pub(crate) fn into_module(self) -> Result<Module, StorageError> {
        let lessons = self
            .lessons
            .into_iter()
            .map(|l| {
                Ok(Lesson::new(
                    LessonId::new(l.id.into_u64("lesson id")?),
                    l.title,
                    parse_lesson_kind(&l.content_type)?,
                    l.duration,
                )
                .with_completed(l.completed))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        let prerequisites = self
            .prerequisites
            .into_iter()
            .map(|p| p.into_u64("prerequisite id").map(ModuleId::new))
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(Module::new(ModuleId::new(self.id.into_u64("module id")?), self.title, lessons)
            .with_prerequisites(prerequisites))
    }
}

//
// ─── ENROLLMENTS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EnrollmentDto {
    course_id: u64,
    #[serde(default)]
    progress: u8,
    #[serde(default)]
    completed: bool,
    enrolled_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    best_scores: BTreeMap<u64, u8>,
}

impl EnrollmentDto {
    pub(crate) fn from_enrollment(enrollment: &Enrollment) -> Self {
        Self {
            course_id: enrollment.course_id().value(),
            progress: enrollment.progress(),
            completed: enrollment.is_completed(),
            enrolled_at: enrollment.enrolled_at(),
            completed_at: enrollment.completed_at(),
            best_scores: enrollment
                .best_scores()
                .iter()
                .map(|(module, score)| (module.value(), *score))
                .collect(),
        }
    }

    pub(crate) fn into_enrollment(self) -> Result<Enrollment, StorageError> {
        // Older rows carry only the flag; use the enrollment time as a floor.
        let completed_at = match (self.completed_at, self.completed) {
            (Some(at), _) => Some(at),
            (None, true) => Some(self.enrolled_at),
            (None, false) => None,
        };
        Enrollment::from_persisted(
            CourseId::new(self.course_id),
            self.progress,
            self.enrolled_at,
            completed_at,
            self.best_scores
                .into_iter()
                .map(|(module, score)| (ModuleId::new(module), score))
                .collect(),
        )
        .map_err(ser)
    }
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AnswerDto {
    question_id: u64,
    selected_option_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OutcomeDto {
    question_id: u64,
    selected_option_id: Option<u64>,
    correct_option_id: u64,
    is_correct: bool,
}

/// Submitted attempt. Summary numbers are written for the backend's
/// convenience and ignored on read; they are rebuilt from the outcomes.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AttemptDto {
    attempt_id: AttemptId,
    course_id: u64,
    module_id: u64,
    submitted_at: DateTime<Utc>,
    answers: Vec<AnswerDto>,
    questions: Vec<OutcomeDto>,
    #[serde(default)]
    score: u8,
    #[serde(default)]
    total_questions: u32,
    #[serde(default)]
    correct_answers: u32,
    #[serde(default)]
    passed: bool,
}

impl AttemptDto {
    pub(crate) fn from_record(record: &QuizAttemptRecord) -> Self {
        let result = &record.result;
        Self {
            attempt_id: record.attempt_id,
            course_id: record.course_id.value(),
            module_id: record.module_id.value(),
            submitted_at: record.submitted_at,
            answers: record
                .answers
                .iter()
                .map(|(q, o)| AnswerDto {
                    question_id: q.value(),
                    selected_option_id: o.value(),
                })
                .collect(),
            questions: result
                .questions()
                .iter()
                .map(|q| OutcomeDto {
                    question_id: q.question_id.value(),
                    selected_option_id: q.selected_option_id.map(|o| o.value()),
                    correct_option_id: q.correct_option_id.value(),
                    is_correct: q.is_correct,
                })
                .collect(),
            score: result.score(),
            total_questions: result.total_questions(),
            correct_answers: result.correct_count(),
            passed: result.passed(),
        }
    }

    pub(crate) fn into_record(self) -> Result<QuizAttemptRecord, StorageError> {
        let answers: Answers = self
            .answers
            .into_iter()
            .map(|a| (QuestionId::new(a.question_id), OptionId::new(a.selected_option_id)))
            .collect();
        let outcomes = self
            .questions
            .into_iter()
            .map(|q| QuestionOutcome {
                question_id: QuestionId::new(q.question_id),
                selected_option_id: q.selected_option_id.map(OptionId::new),
                correct_option_id: OptionId::new(q.correct_option_id),
                is_correct: q.is_correct,
            })
            .collect();
        let result = QuizResult::from_outcomes(outcomes).map_err(ser)?;

        Ok(QuizAttemptRecord {
            attempt_id: self.attempt_id,
            course_id: CourseId::new(self.course_id),
            module_id: ModuleId::new(self.module_id),
            answers,
            result,
            submitted_at: self.submitted_at,
        })
    }
}
