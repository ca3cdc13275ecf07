//! Course progress aggregation and sequential lock resolution.
//!
//! Percentages are always derived from lesson completion flags; nothing here
//! mutates its input. Functions either return a complete result or an error.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::model::{CourseDataError, Enrollment, Lesson, LessonId, Module, ModuleId};

/// `round(100 * part / total)` with halves rounded up; 0 when `total` is 0.
#[must_use]
pub fn rounded_percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u128;
    let total = total as u128;
    // (100p/t + 1/2) floored, kept in integers.
    let percent = (200 * part + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

fn validate_lessons<'a>(
    lessons: impl IntoIterator<Item = &'a Lesson>,
    seen: &mut HashSet<LessonId>,
) -> Result<(), CourseDataError> {
    for lesson in lessons {
        if !seen.insert(lesson.id) {
            return Err(CourseDataError::DuplicateLesson(lesson.id));
        }
        if lesson.duration_minutes < 0 {
            return Err(CourseDataError::NegativeDuration {
                lesson_id: lesson.id,
                minutes: lesson.duration_minutes,
            });
        }
    }
    Ok(())
}

/// Check a course outline's structural invariants.
///
/// # Errors
///
/// Returns `CourseDataError` for repeated module ids, lesson ids repeated
/// anywhere in the course, negative durations, and prerequisites that are
/// unknown or self-referencing.
pub fn validate_course(modules: &[Module]) -> Result<(), CourseDataError> {
    let mut module_ids = HashSet::with_capacity(modules.len());
    let mut lesson_ids = HashSet::new();
    for module in modules {
        if !module_ids.insert(module.id) {
            return Err(CourseDataError::DuplicateModule(module.id));
        }
        validate_lessons(&module.lessons, &mut lesson_ids)?;
    }

    for module in modules {
        for prerequisite in &module.prerequisites {
            if *prerequisite == module.id {
                return Err(CourseDataError::SelfPrerequisite(module.id));
            }
            if !module_ids.contains(prerequisite) {
                return Err(CourseDataError::UnknownPrerequisite {
                    module_id: module.id,
                    prerequisite: *prerequisite,
                });
            }
        }
    }
    Ok(())
}

//
// ─── PERCENTAGES ───────────────────────────────────────────────────────────────
//

/// Completion of one module in percent. A module without lessons is at 0.
///
/// # Errors
///
/// Returns `CourseDataError` if the module's lessons are malformed.
pub fn module_progress(module: &Module) -> Result<u8, CourseDataError> {
    validate_lessons(&module.lessons, &mut HashSet::new())?;
    Ok(rounded_percent(module.completed_lessons(), module.lessons.len()))
}

/// Completion of the whole course, counted over lessons rather than averaged
/// over modules, so modules of different sizes weigh in proportionally.
///
/// # Errors
///
/// Returns `CourseDataError` if the outline is malformed.
pub fn course_progress(modules: &[Module]) -> Result<u8, CourseDataError> {
    validate_course(modules)?;
    let (done, total) = lesson_counts(modules);
    Ok(rounded_percent(done, total))
}

fn lesson_counts(modules: &[Module]) -> (usize, usize) {
    modules.iter().fold((0, 0), |(done, total), module| {
        (done + module.completed_lessons(), total + module.lessons.len())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub percent: u8,
    pub status: ModuleStatus,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

/// Per-module and overall completion for a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub modules: Vec<ModuleProgress>,
    pub percent: u8,
}

impl CourseProgress {
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleProgress> {
        self.modules.iter().find(|m| m.module_id == id)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percent == 100 && self.modules.iter().all(|m| m.status == ModuleStatus::Completed)
    }
}

/// Build the full progress report for a course.
///
/// # Errors
///
/// Returns `CourseDataError` if the outline is malformed.
pub fn course_report(modules: &[Module]) -> Result<CourseProgress, CourseDataError> {
    validate_course(modules)?;

    let per_module = modules
        .iter()
        .map(|module| {
            let completed_lessons = module.completed_lessons();
            let total_lessons = module.lessons.len();
            let status = if module.is_complete() {
                ModuleStatus::Completed
            } else if completed_lessons == 0 {
                ModuleStatus::NotStarted
            } else {
                ModuleStatus::InProgress
            };
            ModuleProgress {
                module_id: module.id,
                percent: rounded_percent(completed_lessons, total_lessons),
                status,
                completed_lessons,
                total_lessons,
            }
        })
        .collect();

    let (done, total) = lesson_counts(modules);
    Ok(CourseProgress {
        modules: per_module,
        percent: rounded_percent(done, total),
    })
}

//
// ─── LOCKING ───────────────────────────────────────────────────────────────────
//

/// Recompute the advisory `locked` flags of every module and lesson.
///
/// Module `i` unlocks when it is the first module or module `i - 1` is fully
/// complete, and every listed prerequisite is fully complete. Inside an
/// unlocked module, lesson `j` unlocks when it is the first lesson or lesson
/// `j - 1` is completed. All lessons of a locked module are locked.
///
/// # Errors
///
/// Returns `CourseDataError` if the outline is malformed.
pub fn resolve_lock_state(modules: &[Module]) -> Result<Vec<Module>, CourseDataError> {
    validate_course(modules)?;

    let complete: HashMap<ModuleId, bool> =
        modules.iter().map(|m| (m.id, m.is_complete())).collect();

    let mut previous_complete = true;
    let resolved = modules
        .iter()
        .map(|module| {
            let prerequisites_met = module
                .prerequisites
                .iter()
                .all(|id| complete.get(id).copied().unwrap_or(false));
            let unlocked = previous_complete && prerequisites_met;
            previous_complete = module.is_complete();

            let mut module = module.clone();
            module.locked = !unlocked;
            let mut previous_done = true;
            for lesson in &mut module.lessons {
                lesson.locked = !(unlocked && previous_done);
                previous_done = lesson.completed;
            }
            module
        })
        .collect();

    Ok(resolved)
}

/// Position of a lesson inside a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonRef {
    pub module_id: ModuleId,
    pub lesson_id: LessonId,
}

/// The first unlocked lesson that is not completed yet, if any.
///
/// # Errors
///
/// Returns `CourseDataError` if the outline is malformed.
pub fn next_lesson(modules: &[Module]) -> Result<Option<LessonRef>, CourseDataError> {
    let resolved = resolve_lock_state(modules)?;
    Ok(resolved.iter().find_map(|module| {
        module
            .lessons
            .iter()
            .find(|l| !l.locked && !l.completed)
            .map(|l| LessonRef {
                module_id: module.id,
                lesson_id: l.id,
            })
    }))
}

/// Return a copy of the outline with one lesson marked completed.
///
/// Marking an already completed lesson is a no-op.
///
/// # Errors
///
/// Returns `CourseDataError::UnknownModule`/`UnknownLesson` for ids not in the
/// outline, or any structural error of the outline itself.
pub fn mark_lesson_completed(
    modules: &[Module],
    module_id: ModuleId,
    lesson_id: LessonId,
) -> Result<Vec<Module>, CourseDataError> {
    validate_course(modules)?;

    let mut updated = modules.to_vec();
    let module = updated
        .iter_mut()
        .find(|m| m.id == module_id)
        .ok_or(CourseDataError::UnknownModule(module_id))?;
    let lesson = module
        .lessons
        .iter_mut()
        .find(|l| l.id == lesson_id)
        .ok_or(CourseDataError::UnknownLesson {
            module_id,
            lesson_id,
        })?;
    lesson.completed = true;
    Ok(updated)
}

//
// ─── DURATIONS ─────────────────────────────────────────────────────────────────
//

fn sum_minutes<'a>(lessons: impl Iterator<Item = &'a Lesson>) -> u64 {
    lessons
        .map(|l| u64::try_from(l.duration_minutes).unwrap_or(0))
        .sum()
}

/// Total authored duration of the course in minutes.
///
/// # Errors
///
/// Returns `CourseDataError` if the outline is malformed.
pub fn total_minutes(modules: &[Module]) -> Result<u64, CourseDataError> {
    validate_course(modules)?;
    Ok(sum_minutes(modules.iter().flat_map(|m| &m.lessons)))
}

/// Minutes left across lessons not yet completed.
///
/// # Errors
///
/// Returns `CourseDataError` if the outline is malformed.
pub fn remaining_minutes(modules: &[Module]) -> Result<u64, CourseDataError> {
    validate_course(modules)?;
    Ok(sum_minutes(
        modules
            .iter()
            .flat_map(|m| &m.lessons)
            .filter(|l| !l.completed),
    ))
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

/// Completion overview across a learner's enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub percent: u8,
}

#[must_use]
pub fn summarize_enrollments(enrollments: &[Enrollment]) -> DashboardSummary {
    let total = enrollments.len();
    let completed = enrollments.iter().filter(|e| e.is_completed()).count();
    DashboardSummary {
        total,
        completed,
        in_progress: total - completed,
        percent: rounded_percent(completed, total),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, LessonKind};
    use crate::time::fixed_now;

    /// Module `id` with `total` lessons, the first `done` completed.
    /// Lesson ids are `100 * id + index` so they stay unique across a course.
    fn module(id: u64, total: u64, done: u64) -> Module {
        let lessons = (0..total)
            .map(|i| {
                Lesson::new(LessonId::new(id * 100 + i), format!("L{i}"), LessonKind::Video, 10)
                    .with_completed(i < done)
            })
            .collect();
        Module::new(ModuleId::new(id), format!("Module {id}"), lessons)
    }

    #[test]
    fn rounded_percent_handles_edges() {
        assert_eq!(rounded_percent(0, 0), 0);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(1, 2), 50);
        assert_eq!(rounded_percent(1, 200), 1);
        assert_eq!(rounded_percent(5, 5), 100);
    }

    #[test]
    fn three_of_four_lessons_is_75() {
        assert_eq!(module_progress(&module(1, 4, 3)).unwrap(), 75);
    }

    #[test]
    fn empty_module_is_zero_not_error() {
        assert_eq!(module_progress(&module(1, 0, 0)).unwrap(), 0);
        assert_eq!(course_progress(&[]).unwrap(), 0);
        assert_eq!(course_progress(&[module(1, 0, 0)]).unwrap(), 0);
    }

    #[test]
    fn course_progress_counts_lessons_not_module_average() {
        let modules = vec![module(1, 2, 1), module(2, 3, 3)];
        assert_eq!(course_progress(&modules).unwrap(), 80);
    }

    #[test]
    fn duplicate_lessons_and_negative_durations_are_rejected() {
        let mut m = module(1, 2, 0);
        m.lessons[1].id = m.lessons[0].id;
        assert_eq!(
            module_progress(&m),
            Err(CourseDataError::DuplicateLesson(LessonId::new(100)))
        );

        let mut m = module(1, 2, 0);
        m.lessons[0].duration_minutes = -5;
        assert_eq!(
            course_progress(&[m]),
            Err(CourseDataError::NegativeDuration {
                lesson_id: LessonId::new(100),
                minutes: -5,
            })
        );
    }

    #[test]
    fn duplicate_modules_are_rejected() {
        let modules = vec![module(1, 1, 0), module(1, 0, 0)];
        assert_eq!(
            resolve_lock_state(&modules),
            Err(CourseDataError::DuplicateModule(ModuleId::new(1)))
        );
    }

    #[test]
    fn lesson_ids_must_be_unique_across_modules() {
        let mut second = module(2, 1, 0);
        second.lessons[0].id = LessonId::new(100);
        let modules = vec![module(1, 1, 0), second];
        assert_eq!(
            course_progress(&modules),
            Err(CourseDataError::DuplicateLesson(LessonId::new(100)))
        );
    }

    #[test]
    fn completed_first_module_unlocks_only_the_second() {
        let modules = vec![module(1, 2, 2), module(2, 2, 0), module(3, 2, 0)];
        let resolved = resolve_lock_state(&modules).unwrap();

        assert!(!resolved[0].locked);
        assert!(!resolved[1].locked);
        assert!(resolved[2].locked);

        // Inside module 2 only the first lesson is open.
        assert!(!resolved[1].lessons[0].locked);
        assert!(resolved[1].lessons[1].locked);
        // Locked modules lock all of their lessons.
        assert!(resolved[2].lessons.iter().all(|l| l.locked));
    }

    #[test]
    fn lessons_unlock_one_after_another() {
        let resolved = resolve_lock_state(&[module(1, 4, 2)]).unwrap();
        let locked: Vec<bool> = resolved[0].lessons.iter().map(|l| l.locked).collect();
        assert_eq!(locked, vec![false, false, false, true]);
    }

    #[test]
    fn lock_resolution_ignores_incoming_flags() {
        let mut first = module(1, 1, 0);
        first.locked = true;
        first.lessons[0].locked = true;
        let resolved = resolve_lock_state(&[first]).unwrap();
        assert!(!resolved[0].locked);
        assert!(!resolved[0].lessons[0].locked);
    }

    #[test]
    fn empty_module_keeps_the_next_one_locked() {
        let modules = vec![module(1, 0, 0), module(2, 1, 0)];
        let resolved = resolve_lock_state(&modules).unwrap();
        assert!(!resolved[0].locked);
        assert!(resolved[1].locked);
    }

    #[test]
    fn prerequisites_must_also_be_complete() {
        let modules = vec![
            module(1, 1, 0),
            module(2, 1, 1),
            module(3, 1, 0).with_prerequisites(vec![ModuleId::new(1)]),
        ];
        let resolved = resolve_lock_state(&modules).unwrap();
        // Module 2 is complete, but prerequisite module 1 is not.
        assert!(resolved[2].locked);
    }

    #[test]
    fn bad_prerequisites_are_rejected() {
        let modules = vec![module(1, 1, 0).with_prerequisites(vec![ModuleId::new(9)])];
        assert_eq!(
            validate_course(&modules),
            Err(CourseDataError::UnknownPrerequisite {
                module_id: ModuleId::new(1),
                prerequisite: ModuleId::new(9),
            })
        );

        let modules = vec![module(1, 1, 0).with_prerequisites(vec![ModuleId::new(1)])];
        assert_eq!(
            validate_course(&modules),
            Err(CourseDataError::SelfPrerequisite(ModuleId::new(1)))
        );
    }

    #[test]
    fn report_classifies_modules() {
        let modules = vec![module(1, 2, 2), module(2, 4, 1), module(3, 0, 0)];
        let report = course_report(&modules).unwrap();

        let statuses: Vec<ModuleStatus> = report.modules.iter().map(|m| m.status).collect();
        assert_eq!(
            statuses,
            vec![
                ModuleStatus::Completed,
                ModuleStatus::InProgress,
                ModuleStatus::NotStarted
            ]
        );
        assert_eq!(report.module(ModuleId::new(2)).unwrap().percent, 25);
        assert_eq!(report.percent, 50);
        assert!(!report.is_complete());
    }

    #[test]
    fn marking_a_lesson_returns_a_new_outline() {
        let modules = vec![module(1, 2, 0)];
        let updated =
            mark_lesson_completed(&modules, ModuleId::new(1), LessonId::new(101)).unwrap();

        assert!(!modules[0].lessons[1].completed);
        assert!(updated[0].lessons[1].completed);
        assert_eq!(course_progress(&updated).unwrap(), 50);
    }

    #[test]
    fn marking_unknown_ids_fails() {
        let modules = vec![module(1, 1, 0)];
        assert_eq!(
            mark_lesson_completed(&modules, ModuleId::new(2), LessonId::new(100)),
            Err(CourseDataError::UnknownModule(ModuleId::new(2)))
        );
        assert_eq!(
            mark_lesson_completed(&modules, ModuleId::new(1), LessonId::new(999)),
            Err(CourseDataError::UnknownLesson {
                module_id: ModuleId::new(1),
                lesson_id: LessonId::new(999),
            })
        );
    }

    #[test]
    fn next_lesson_follows_lock_order() {
        let modules = vec![module(1, 2, 2), module(2, 3, 1)];
        assert_eq!(
            next_lesson(&modules).unwrap(),
            Some(LessonRef {
                module_id: ModuleId::new(2),
                lesson_id: LessonId::new(201),
            })
        );

        let done = vec![module(1, 1, 1)];
        assert_eq!(next_lesson(&done).unwrap(), None);
    }

    #[test]
    fn durations_sum_over_lessons() {
        let modules = vec![module(1, 2, 1), module(2, 3, 0)];
        assert_eq!(total_minutes(&modules).unwrap(), 50);
        assert_eq!(remaining_minutes(&modules).unwrap(), 40);
    }

    #[test]
    fn dashboard_summary_counts_completed_enrollments() {
        let now = fixed_now();
        let mut done = Enrollment::new(CourseId::new(1), now);
        done.record_progress(100, now);
        let open = Enrollment::new(CourseId::new(2), now);
        let also_open = Enrollment::new(CourseId::new(3), now);

        let summary = summarize_enrollments(&[done, open, also_open]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.in_progress, 2);
        assert_eq!(summary.percent, 33);

        assert_eq!(summarize_enrollments(&[]).percent, 0);
    }
}
