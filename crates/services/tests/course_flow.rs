use learn_core::model::{CourseId, Lesson, LessonId, LessonKind, Module, ModuleId};
use learn_core::time::fixed_now;
use services::{AppServices, Clock, CourseServiceError};
use storage::repository::{CourseRepository, InMemoryRepository, Storage};

fn lesson(id: u64, minutes: i32) -> Lesson {
    Lesson::new(LessonId::new(id), format!("Lesson {id}"), LessonKind::Text, minutes)
}

fn seeded(course: CourseId) -> (InMemoryRepository, AppServices) {
    let repo = InMemoryRepository::new();
    repo.insert_course(
        course,
        vec![
            Module::new(ModuleId::new(1), "Intro", vec![lesson(1, 10), lesson(2, 20)]),
            Module::new(ModuleId::new(2), "Deeper", vec![lesson(3, 30)]),
        ],
    )
    .unwrap();
    let services = AppServices::from_storage(
        Clock::fixed(fixed_now()),
        &Storage::from_repository(repo.clone()),
    );
    (repo, services)
}

#[tokio::test]
async fn completing_lessons_advances_progress_and_unlocks_modules() {
    let course = CourseId::new(5);
    let (_repo, services) = seeded(course);
    let courses = services.courses();

    let enrollment = courses.enroll(course).await.unwrap();
    assert_eq!(enrollment.progress(), 0);

    let outline = courses.outline(course).await.unwrap();
    assert!(outline.module(ModuleId::new(2)).unwrap().locked);
    assert_eq!(outline.remaining_minutes, 60);

    let step = courses
        .complete_lesson(course, ModuleId::new(1), LessonId::new(1))
        .await
        .unwrap();
    assert_eq!(step.outline.percent(), 33);
    assert_eq!(step.enrollment.as_ref().unwrap().progress(), 33);
    assert!(step.outline.module(ModuleId::new(2)).unwrap().locked);
    assert!(!step.course_completed);

    let step = courses
        .complete_lesson(course, ModuleId::new(1), LessonId::new(2))
        .await
        .unwrap();
    assert_eq!(step.outline.percent(), 67);
    assert!(!step.outline.module(ModuleId::new(2)).unwrap().locked);

    let step = courses
        .complete_lesson(course, ModuleId::new(2), LessonId::new(3))
        .await
        .unwrap();
    assert_eq!(step.outline.percent(), 100);
    assert!(step.course_completed);
    assert_eq!(step.outline.next_lesson, None);
    assert_eq!(step.outline.remaining_minutes, 0);
    let enrollment = step.enrollment.unwrap();
    assert!(enrollment.is_completed());
    assert_eq!(enrollment.completed_at(), Some(fixed_now()));

    // Enrolling again keeps the existing record.
    assert_eq!(courses.enroll(course).await.unwrap(), enrollment);
}

#[tokio::test]
async fn unknown_lesson_is_rejected_without_persisting() {
    let course = CourseId::new(5);
    let (repo, services) = seeded(course);

    let err = services
        .courses()
        .complete_lesson(course, ModuleId::new(1), LessonId::new(3))
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::CourseData(_)));

    let modules = repo.get_modules(course).await.unwrap();
    assert!(modules.iter().flat_map(|m| &m.lessons).all(|l| !l.completed));
}

#[tokio::test]
async fn locked_lessons_can_still_be_completed() {
    let course = CourseId::new(5);
    let (_repo, services) = seeded(course);

    let step = services
        .courses()
        .complete_lesson(course, ModuleId::new(2), LessonId::new(3))
        .await
        .unwrap();
    assert_eq!(step.outline.percent(), 33);
    assert!(step.enrollment.is_none());
    assert!(!step.course_completed);
}

#[tokio::test]
async fn missing_course_surfaces_storage_error() {
    let (_repo, services) = seeded(CourseId::new(5));
    assert!(matches!(
        services.courses().outline(CourseId::new(6)).await,
        Err(CourseServiceError::Storage(_))
    ));
}

#[tokio::test]
async fn dashboard_counts_completed_enrollments() {
    let repo = InMemoryRepository::new();
    repo.insert_course(CourseId::new(1), vec![Module::new(ModuleId::new(1), "A", vec![lesson(1, 5)])])
        .unwrap();
    repo.insert_course(CourseId::new(2), vec![Module::new(ModuleId::new(2), "B", vec![lesson(2, 5)])])
        .unwrap();
    let services = AppServices::from_storage(
        Clock::fixed(fixed_now()),
        &Storage::from_repository(repo.clone()),
    );

    services.courses().enroll(CourseId::new(1)).await.unwrap();
    services.courses().enroll(CourseId::new(2)).await.unwrap();
    services
        .courses()
        .complete_lesson(CourseId::new(2), ModuleId::new(2), LessonId::new(2))
        .await
        .unwrap();

    let dashboard = services.dashboard().summary().await.unwrap();
    assert_eq!(dashboard.summary.total, 2);
    assert_eq!(dashboard.summary.completed, 1);
    assert_eq!(dashboard.summary.in_progress, 1);
    assert_eq!(dashboard.summary.percent, 50);
    assert_eq!(dashboard.enrollments[0].course_id(), CourseId::new(1));
    assert_eq!(dashboard.generated_at, fixed_now());
}
