//! Organization side: review applicants and move their applications along.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::api::{ApplicationId, ApplicationRecord, ApplicationStatus};
use crate::http::ApiError;

pub trait ApplicantGateway: Send + Sync {
    fn applicants(
        &self,
        organization_id: &str,
    ) -> impl Future<Output = Result<Vec<ApplicationRecord>, ApiError>> + Send;

    fn set_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug)]
pub struct ApplicantBoard<G> {
    gateway: G,
    organization_id: String,
    updating: Mutex<Option<ApplicationId>>,
}

impl<G: ApplicantGateway> ApplicantBoard<G> {
    pub fn new(gateway: G, organization_id: impl Into<String>) -> Self {
        Self {
            gateway,
            organization_id: organization_id.into(),
            updating: Mutex::new(None),
        }
    }

    pub async fn applicants(&self) -> Result<Vec<ApplicationRecord>, ApiError> {
        self.gateway.applicants(&self.organization_id).await
    }

    /// Application whose status change is currently in flight.
    pub fn updating(&self) -> Option<ApplicationId> {
        *self.updating.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), ApiError> {
        *self.updating.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        let result = self.gateway.set_status(id, status).await;
        *self.updating.lock().unwrap_or_else(PoisonError::into_inner) = None;

        match &result {
            Ok(()) => info!(application = id, status = status.code(), "application status updated"),
            Err(err) => warn!(application = id, error = %err, "could not update application status"),
        }
        result
    }

    /// Hiring is accepting the application.
    pub async fn hire(&self, id: ApplicationId) -> Result<(), ApiError> {
        self.update_status(id, ApplicationStatus::Accepted).await
    }
}
