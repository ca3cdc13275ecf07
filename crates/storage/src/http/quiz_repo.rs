use async_trait::async_trait;
use learn_core::model::{ModuleId, Question};

use super::HttpRepository;
use super::dto::QuestionDto;
use crate::repository::{QuizRepository, StorageError};

#[async_trait]
impl QuizRepository for HttpRepository {
    async fn get_questions(&self, module_id: ModuleId) -> Result<Vec<Question>, StorageError> {
        let rows: Vec<QuestionDto> = self
            .get_json(&format!("quizzes/module/{module_id}"))
            .await?;
        rows.into_iter().map(QuestionDto::into_question).collect()
    }
}
