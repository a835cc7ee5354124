use std::sync::Arc;

use tracing::info;

use super::{QueryCache, QueryKey, QueryOptions, FEATURED_STALE_TIME};
use crate::api::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Career, CareerAssignment, CareerId,
    CareerUpdate, JobBoardClient, NewApplication, OfferDraft, OfferId, OfferRecord,
    OrganizationRecord, OrganizationUpdate, Student, StudentCareerRecord, StudentUpdate,
    University, UniversityId,
};
use crate::applicants::ApplicantGateway;
use crate::discovery::ApplicationGateway;
use crate::http::ApiError;
use crate::profile::{CatalogSource, EnrollmentGateway};

/// Cached reads and invalidating writes over [`JobBoardClient`].
#[derive(Debug, Clone)]
pub struct Queries {
    client: JobBoardClient,
    cache: Arc<QueryCache>,
}

fn offers_key() -> QueryKey {
    QueryKey::new(["offers"])
}

fn organization_offers_key(organization_id: &str) -> QueryKey {
    offers_key().child("organization").child(organization_id)
}

fn students_key() -> QueryKey {
    QueryKey::new(["students"])
}

fn student_careers_key(student_id: &str) -> QueryKey {
    students_key().child("careers").child(student_id)
}

fn applications_key() -> QueryKey {
    QueryKey::new(["applications"])
}

impl Queries {
    pub fn new(client: JobBoardClient) -> Self {
        Self::with_cache(client, Arc::new(QueryCache::new()))
    }

    pub fn with_cache(client: JobBoardClient, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &JobBoardClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn offers(&self) -> Result<Vec<OfferRecord>, ApiError> {
        self.cache
            .fetch(&offers_key(), QueryOptions::default(), || async move {
                self.client.offers().list().await
            })
            .await
            .map(Option::unwrap_or_default)
    }

    /// Disabled when no organization id is known.
    pub async fn organization_offers(
        &self,
        organization_id: &str,
    ) -> Result<Option<Vec<OfferRecord>>, ApiError> {
        let options = QueryOptions::default().enabled(!organization_id.is_empty());
        self.cache
            .fetch(&organization_offers_key(organization_id), options, || async move {
                self.client
                    .offers()
                    .list_by_organization(organization_id)
                    .await
            })
            .await
    }

    pub async fn organization(&self, id: &str) -> Result<Option<OrganizationRecord>, ApiError> {
        let key = QueryKey::new(["organizations", id]);
        let options = QueryOptions::default().enabled(!id.is_empty());
        self.cache
            .fetch(&key, options, || async move {
                self.client.organizations().get(id).await
            })
            .await
    }

    pub async fn featured_organizations(&self) -> Result<Vec<OrganizationRecord>, ApiError> {
        let key = QueryKey::new(["organizations", "featured"]);
        self.cache
            .fetch(&key, QueryOptions::stale_after(FEATURED_STALE_TIME), || async move {
                self.client.organizations().featured().await
            })
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn student(&self, id: &str) -> Result<Option<Student>, ApiError> {
        let options = QueryOptions::default().enabled(!id.is_empty());
        self.cache
            .fetch(&students_key().child(id), options, || async move {
                self.client.students().get(id).await
            })
            .await
    }

    pub async fn student_careers(
        &self,
        student_id: &str,
    ) -> Result<Option<Vec<StudentCareerRecord>>, ApiError> {
        let options = QueryOptions::default().enabled(!student_id.is_empty());
        self.cache
            .fetch(&student_careers_key(student_id), options, || async move {
                self.client.students().list_careers(student_id).await
            })
            .await
    }

    pub async fn universities(&self) -> Result<Vec<University>, ApiError> {
        self.cache
            .fetch(&QueryKey::new(["universities"]), QueryOptions::default(), || async move {
                self.client.universities().list().await
            })
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn careers(&self, university_id: UniversityId) -> Result<Vec<Career>, ApiError> {
        let key = QueryKey::new(["universities"])
            .child(university_id.to_string())
            .child("careers");
        self.cache
            .fetch(&key, QueryOptions::default(), || async move {
                self.client.universities().careers(university_id).await
            })
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn student_applications(
        &self,
        student_id: &str,
    ) -> Result<Option<Vec<ApplicationRecord>>, ApiError> {
        let key = applications_key().child("student").child(student_id);
        let options = QueryOptions::default().enabled(!student_id.is_empty());
        self.cache
            .fetch(&key, options, || async move {
                self.client.applications().list_by_student(student_id).await
            })
            .await
    }

    pub async fn organization_applications(
        &self,
        organization_id: &str,
    ) -> Result<Option<Vec<ApplicationRecord>>, ApiError> {
        let key = applications_key().child("organization").child(organization_id);
        let options = QueryOptions::default().enabled(!organization_id.is_empty());
        self.cache
            .fetch(&key, options, || async move {
                self.client
                    .applications()
                    .list_by_organization(organization_id)
                    .await
            })
            .await
    }

    pub async fn create_offer(&self, draft: &OfferDraft) -> Result<OfferRecord, ApiError> {
        let offer = self.client.offers().create(draft).await?;
        self.invalidate_offers(&offer.organization_id);
        info!(offer = offer.id, "offer created");
        Ok(offer)
    }

    pub async fn update_offer(&self, id: OfferId, draft: &OfferDraft) -> Result<OfferRecord, ApiError> {
        let offer = self.client.offers().update(id, draft).await?;
        self.invalidate_offers(&offer.organization_id);
        Ok(offer)
    }

    pub async fn delete_offer(&self, id: OfferId, organization_id: &str) -> Result<(), ApiError> {
        self.client.offers().remove(id).await?;
        self.invalidate_offers(organization_id);
        info!(offer = id, "offer deleted");
        Ok(())
    }

    pub async fn update_organization(
        &self,
        id: &str,
        update: &OrganizationUpdate,
    ) -> Result<OrganizationRecord, ApiError> {
        let organization = self.client.organizations().update(id, update).await?;
        self.cache.invalidate(&QueryKey::new(["organizations"]));
        Ok(organization)
    }

    pub async fn update_student(&self, id: &str, update: &StudentUpdate) -> Result<(), ApiError> {
        self.client.students().update(id, update).await?;
        self.cache.invalidate(&students_key());
        self.cache.invalidate(&students_key().child(id));
        Ok(())
    }

    pub async fn assign_career(
        &self,
        student_id: &str,
        assignment: &CareerAssignment,
    ) -> Result<(), ApiError> {
        self.client
            .students()
            .assign_career(student_id, assignment)
            .await?;
        self.cache.invalidate(&student_careers_key(student_id));
        Ok(())
    }

    pub async fn update_career(
        &self,
        student_id: &str,
        career_id: CareerId,
        update: &CareerUpdate,
    ) -> Result<(), ApiError> {
        self.client
            .students()
            .update_career(student_id, career_id, update)
            .await?;
        self.cache.invalidate(&student_careers_key(student_id));
        Ok(())
    }

    pub async fn remove_career(&self, student_id: &str, career_id: CareerId) -> Result<(), ApiError> {
        self.client
            .students()
            .remove_career(student_id, career_id)
            .await?;
        self.cache.invalidate(&student_careers_key(student_id));
        Ok(())
    }

    pub async fn create_application(&self, application: &NewApplication) -> Result<(), ApiError> {
        self.client.applications().create(application).await?;
        self.cache.invalidate(&applications_key());
        Ok(())
    }

    pub async fn update_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), ApiError> {
        self.client.applications().update_status(id, status).await?;
        self.cache.invalidate(&applications_key());
        Ok(())
    }

    fn invalidate_offers(&self, organization_id: &str) {
        self.cache.invalidate(&offers_key());
        if !organization_id.is_empty() {
            self.cache.invalidate(&organization_offers_key(organization_id));
        }
    }
}

impl ApplicationGateway for Queries {
    async fn submit_application(&self, application: &NewApplication) -> Result<(), ApiError> {
        self.create_application(application).await
    }
}

impl EnrollmentGateway for Queries {
    async fn assign_career(
        &self,
        student_id: &str,
        assignment: &CareerAssignment,
    ) -> Result<(), ApiError> {
        Queries::assign_career(self, student_id, assignment).await
    }

    async fn update_career(
        &self,
        student_id: &str,
        career_id: CareerId,
        update: &CareerUpdate,
    ) -> Result<(), ApiError> {
        Queries::update_career(self, student_id, career_id, update).await
    }

    async fn remove_career(&self, student_id: &str, career_id: CareerId) -> Result<(), ApiError> {
        Queries::remove_career(self, student_id, career_id).await
    }

    async fn update_student(&self, student_id: &str, update: &StudentUpdate) -> Result<(), ApiError> {
        Queries::update_student(self, student_id, update).await
    }

    async fn enrollments(&self, student_id: &str) -> Result<Vec<StudentCareerRecord>, ApiError> {
        self.student_careers(student_id)
            .await
            .map(Option::unwrap_or_default)
    }
}

impl CatalogSource for Queries {
    async fn careers_for(&self, university_id: UniversityId) -> Result<Vec<Career>, ApiError> {
        self.careers(university_id).await
    }
}

impl ApplicantGateway for Queries {
    async fn applicants(&self, organization_id: &str) -> Result<Vec<ApplicationRecord>, ApiError> {
        self.organization_applications(organization_id)
            .await
            .map(Option::unwrap_or_default)
    }

    async fn set_status(&self, id: ApplicationId, status: ApplicationStatus) -> Result<(), ApiError> {
        self.update_application_status(id, status).await
    }
}
