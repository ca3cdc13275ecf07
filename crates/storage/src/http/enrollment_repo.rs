use async_trait::async_trait;
use learn_core::model::{CourseId, Enrollment};
use reqwest::Method;

use super::HttpRepository;
use super::dto::EnrollmentDto;
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait]
impl EnrollmentRepository for HttpRepository {
    async fn get_enrollment(
        &self,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        match self
            .get_json::<EnrollmentDto>(&format!("courses/{course_id}/enrollment"))
            .await
        {
            Ok(dto) => dto.into_enrollment().map(Some),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let body = EnrollmentDto::from_enrollment(enrollment);
        self.send_json(
            Method::PUT,
            &format!("courses/{}/enrollment", enrollment.course_id()),
            Some(&body),
        )
        .await
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StorageError> {
        let rows: Vec<EnrollmentDto> = self.get_json("enrollments/me").await?;
        let mut enrollments = rows
            .into_iter()
            .map(EnrollmentDto::into_enrollment)
            .collect::<Result<Vec<_>, _>>()?;
        enrollments.sort_by_key(Enrollment::course_id);
        Ok(enrollments)
    }
}
