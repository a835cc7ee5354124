use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::info;

use super::names::OrganizationNames;
use super::refresh::{refresh_once, CycleOutcome, Refresh};
use super::source::{ApplicationSource, OfferSource};
use super::view::format_date;
use crate::api::{ApplicationId, ApplicationStatus, OfferId};
use crate::http::ApiError;

/// A student's application joined with the offer it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub offer_id: OfferId,
    pub offer_title: String,
    pub organization_name: String,
    pub status: ApplicationStatus,
    pub submitted: String,
}

#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    pub applications: Arc<Vec<ApplicationSummary>>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Polled "my applications" list for one student.
#[derive(Debug)]
pub struct ApplicationHistory<S> {
    source: S,
    student_id: String,
    names: OrganizationNames,
    state: RwLock<HistorySnapshot>,
}

impl<S> ApplicationHistory<S>
where
    S: OfferSource + ApplicationSource + 'static,
{
    pub fn new(source: S, student_id: impl Into<String>) -> Self {
        Self {
            source,
            student_id: student_id.into(),
            names: OrganizationNames::new(),
            state: RwLock::new(HistorySnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn refresh(&self) -> CycleOutcome {
        refresh_once(self).await
    }

    fn update(&self, apply: impl FnOnce(&mut HistorySnapshot)) {
        apply(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }
}

impl<S> Refresh for ApplicationHistory<S>
where
    S: OfferSource + ApplicationSource + 'static,
{
    type Output = Vec<ApplicationSummary>;

    fn name(&self) -> &'static str {
        "applications"
    }

    fn begin(&self) {
        self.update(|state| state.loading = true);
    }

    async fn load(&self) -> Result<Vec<ApplicationSummary>, ApiError> {
        let records = self.source.student_applications(&self.student_id).await?;
        let offers = self.source.list_offers().await?;
        let offers: HashMap<OfferId, _> = offers.into_iter().map(|offer| (offer.id, offer)).collect();

        self.names
            .resolve_missing(
                &self.source,
                records
                    .iter()
                    .filter_map(|record| offers.get(&record.offer_id))
                    .map(|offer| offer.organization_id.as_str()),
            )
            .await;

        Ok(records
            .into_iter()
            .map(|record| {
                let offer = offers.get(&record.offer_id);
                let offer_title = offer
                    .map(|offer| offer.title.clone())
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| format!("Offer #{}", record.offer_id));
                let organization_name = self
                    .names
                    .name_or_placeholder(offer.map_or("", |offer| offer.organization_id.as_str()));
                ApplicationSummary {
                    id: record.id,
                    offer_id: record.offer_id,
                    offer_title,
                    organization_name,
                    status: record.status,
                    submitted: format_date(record.submitted_at.as_deref()),
                }
            })
            .collect())
    }

    fn commit(&self, applications: Vec<ApplicationSummary>) {
        info!(count = applications.len(), student = %self.student_id, "application history refreshed");
        self.update(|state| {
            state.applications = Arc::new(applications);
            state.loading = false;
            state.error = None;
        });
    }

    fn fail(&self, message: String) {
        self.update(|state| {
            state.error = Some(message);
            state.loading = false;
        });
    }
}
