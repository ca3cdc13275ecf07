use async_trait::async_trait;
use learn_core::model::{CourseId, LessonId, Module, ModuleId};
use reqwest::Method;

use super::HttpRepository;
use super::dto::ModuleDto;
use crate::repository::{CourseRepository, StorageError};

#[async_trait]
impl CourseRepository for HttpRepository {
    async fn get_modules(&self, course_id: CourseId) -> Result<Vec<Module>, StorageError> {
        let rows: Vec<ModuleDto> = self
            .get_json(&format!("courses/{course_id}/modules"))
            .await?;
        rows.into_iter().map(ModuleDto::into_module).collect()
    }

    async fn set_lesson_completed(
        &self,
        course_id: CourseId,
        module_id: ModuleId,
        lesson_id: LessonId,
    ) -> Result<(), StorageError> {
        self.send_json::<()>(
            Method::POST,
            &format!("courses/{course_id}/modules/{module_id}/lessons/{lesson_id}/complete"),
            None,
        )
        .await
    }
}
