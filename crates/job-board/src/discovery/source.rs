use std::future::Future;

use crate::api::{ApplicationRecord, JobBoardClient, OfferRecord};
use crate::http::ApiError;

/// Read side the discovery engine and history polls go through.
pub trait OfferSource: Send + Sync {
    fn list_offers(&self) -> impl Future<Output = Result<Vec<OfferRecord>, ApiError>> + Send;

    fn organization_name(
        &self,
        organization_id: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

pub trait ApplicationSource: Send + Sync {
    fn student_applications(
        &self,
        student_id: &str,
    ) -> impl Future<Output = Result<Vec<ApplicationRecord>, ApiError>> + Send;
}

impl OfferSource for JobBoardClient {
    async fn list_offers(&self) -> Result<Vec<OfferRecord>, ApiError> {
        self.offers().list().await
    }

    async fn organization_name(&self, organization_id: &str) -> Result<String, ApiError> {
        self.organizations()
            .get(organization_id)
            .await
            .map(|organization| organization.name)
    }
}

impl ApplicationSource for JobBoardClient {
    async fn student_applications(
        &self,
        student_id: &str,
    ) -> Result<Vec<ApplicationRecord>, ApiError> {
        self.applications().list_by_student(student_id).await
    }
}
