use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems in a course outline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseDataError {
    #[error("module {0} appears more than once")]
    DuplicateModule(ModuleId),

    #[error("lesson {0} appears more than once")]
    DuplicateLesson(LessonId),

    #[error("lesson {lesson_id} has a negative duration ({minutes} min)")]
    NegativeDuration { lesson_id: LessonId, minutes: i32 },

    #[error("module {0} does not exist")]
    UnknownModule(ModuleId),

    #[error("lesson {lesson_id} does not exist in module {module_id}")]
    UnknownLesson {
        module_id: ModuleId,
        lesson_id: LessonId,
    },

    #[error("module {module_id} lists unknown prerequisite {prerequisite}")]
    UnknownPrerequisite {
        module_id: ModuleId,
        prerequisite: ModuleId,
    },

    #[error("module {0} lists itself as a prerequisite")]
    SelfPrerequisite(ModuleId),
}

//
// ─── LESSONS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Quiz,
    Text,
}

/// A single unit of course content.
///
/// `completed` is owned by the persistence collaborator; `locked` is advisory
/// and recomputed by `progress::resolve_lock_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub kind: LessonKind,
    pub duration_minutes: i32,
    pub completed: bool,
    pub locked: bool,
}

impl Lesson {
    #[must_use]
    pub fn new(id: LessonId, title: impl Into<String>, kind: LessonKind, duration_minutes: i32) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            duration_minutes,
            completed: false,
            locked: false,
        }
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

//
// ─── MODULES ───────────────────────────────────────────────────────────────────
//

/// An ordered group of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub lessons: Vec<Lesson>,
    pub locked: bool,
    /// Modules that must be complete before this one unlocks, on top of the
    /// sequential rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<ModuleId>,
}

impl Module {
    #[must_use]
    pub fn new(id: ModuleId, title: impl Into<String>, lessons: Vec<Lesson>) -> Self {
        Self {
            id,
            title: title.into(),
            lessons,
            locked: false,
            prerequisites: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_prerequisites(mut self, prerequisites: Vec<ModuleId>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    #[must_use]
    pub fn completed_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.completed).count()
    }

    /// True when the module has content and every lesson is completed.
    ///
    /// An empty module is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.lessons.is_empty() && self.lessons.iter().all(|l| l.completed)
    }

    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_is_not_complete() {
        let module = Module::new(ModuleId::new(1), "Intro", Vec::new());
        assert!(!module.is_complete());
        assert_eq!(module.completed_lessons(), 0);
    }

    #[test]
    fn module_complete_when_all_lessons_done() {
        let module = Module::new(
            ModuleId::new(1),
            "Intro",
            vec![
                Lesson::new(LessonId::new(1), "a", LessonKind::Video, 5).with_completed(true),
                Lesson::new(LessonId::new(2), "b", LessonKind::Text, 3).with_completed(true),
            ],
        );
        assert!(module.is_complete());
        assert_eq!(module.completed_lessons(), 2);
    }

    #[test]
    fn lesson_kind_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&LessonKind::Quiz).unwrap();
        assert_eq!(json, "\"quiz\"");
    }
}
