//! Typed resource clients over the REST backend.

pub mod applications;
pub mod auth;
pub mod offers;
pub mod organizations;
pub mod payload;
pub mod students;
pub mod universities;

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::http::HttpClient;
use crate::session::SessionContext;

pub use applications::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationsApi, NewApplication,
};
pub use auth::{AuthApi, AuthError, OrganizationRegistration, Profile, StudentRegistration};
pub use offers::{OfferDraft, OfferId, OfferRecord, OffersApi};
pub use organizations::{OrganizationRecord, OrganizationUpdate, OrganizationsApi};
pub use payload::{normalize_list, ListPayload};
pub use students::{
    CareerAssignment, CareerId, CareerUpdate, Student, StudentCareerRecord, StudentUpdate,
    StudentsApi,
};
pub use universities::{Career, UniversitiesApi, University, UniversityId};

/// Entry point bundling every resource client behind one cheaply clonable handle.
#[derive(Debug, Clone)]
pub struct JobBoardClient {
    http: Arc<HttpClient>,
}

impl JobBoardClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> Self {
        Self {
            http: Arc::new(HttpClient::new(config, session)),
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn session(&self) -> &SessionContext {
        self.http.session()
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { http: &self.http }
    }

    pub fn offers(&self) -> OffersApi<'_> {
        OffersApi { http: &self.http }
    }

    pub fn organizations(&self) -> OrganizationsApi<'_> {
        OrganizationsApi { http: &self.http }
    }

    pub fn applications(&self) -> ApplicationsApi<'_> {
        ApplicationsApi { http: &self.http }
    }

    pub fn students(&self) -> StudentsApi<'_> {
        StudentsApi { http: &self.http }
    }

    pub fn universities(&self) -> UniversitiesApi<'_> {
        UniversitiesApi { http: &self.http }
    }
}
