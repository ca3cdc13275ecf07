use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use learn_core::model::Enrollment;
use learn_core::progress::{DashboardSummary, summarize_enrollments};
use storage::repository::EnrollmentRepository;

use crate::Clock;
use crate::error::DashboardError;

/// Learner overview: aggregate counts plus the enrollments they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub enrollments: Vec<Enrollment>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, enrollments: Arc<dyn EnrollmentRepository>) -> Self {
        Self { clock, enrollments }
    }

    /// Build the dashboard from the learner's current enrollments.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if enrollments cannot be listed.
    pub async fn summary(&self) -> Result<Dashboard, DashboardError> {
        let enrollments = self.enrollments.list_enrollments().await?;
        let summary = summarize_enrollments(&enrollments);
        debug!(
            total = summary.total,
            completed = summary.completed,
            "dashboard summarized"
        );
        Ok(Dashboard {
            summary,
            enrollments,
            generated_at: self.clock.now(),
        })
    }
}
