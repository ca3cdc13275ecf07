use async_trait::async_trait;
use learn_core::model::ModuleId;
use reqwest::Method;

use super::HttpRepository;
use super::dto::AttemptDto;
use crate::repository::{AttemptRepository, QuizAttemptRecord, StorageError};

#[async_trait]
impl AttemptRepository for HttpRepository {
    async fn append_attempt(&self, record: &QuizAttemptRecord) -> Result<(), StorageError> {
        let body = AttemptDto::from_record(record);
        self.send_json(
            Method::POST,
            &format!("quizzes/module/{}/attempts", record.module_id),
            Some(&body),
        )
        .await
    }

    async fn list_attempts(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError> {
        let rows: Vec<AttemptDto> = self
            .get_json(&format!("quizzes/module/{module_id}/attempts"))
            .await?;
        rows.into_iter().map(AttemptDto::into_record).collect()
    }
}
