use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::info;

use super::filter::{NormalizedCriteria, OfferCriteria, SortMode};
use super::names::OrganizationNames;
use super::refresh::{refresh_once, CycleOutcome, Refresh};
use super::source::OfferSource;
use super::view::OfferView;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::http::ApiError;

/// What readers see: the canonical list plus the status of the last cycle.
#[derive(Debug, Clone, Default)]
pub struct DiscoverySnapshot {
    pub offers: Arc<Vec<OfferView>>,
    pub loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Keeps the canonical offer list fresh and the organization names memoized.
#[derive(Debug)]
pub struct DiscoveryEngine<S> {
    source: S,
    names: OrganizationNames,
    state: RwLock<DiscoverySnapshot>,
}

impl<S: OfferSource + 'static> DiscoveryEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            names: OrganizationNames::new(),
            state: RwLock::new(DiscoverySnapshot::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn names(&self) -> &OrganizationNames {
        &self.names
    }

    pub fn snapshot(&self) -> DiscoverySnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn offers(&self) -> Arc<Vec<OfferView>> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner).offers)
    }

    /// One cycle in the caller's task; same path the periodic loop takes.
    pub async fn refresh(&self) -> CycleOutcome {
        refresh_once(self).await
    }

    fn update(&self, apply: impl FnOnce(&mut DiscoverySnapshot)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }
}

impl<S: OfferSource + 'static> Refresh for DiscoveryEngine<S> {
    type Output = Vec<OfferView>;

    fn name(&self) -> &'static str {
        "offers"
    }

    fn begin(&self) {
        self.update(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    async fn load(&self) -> Result<Vec<OfferView>, ApiError> {
        let records = self.source.list_offers().await?;
        self.names
            .resolve_missing(
                &self.source,
                records.iter().map(|record| record.organization_id.as_str()),
            )
            .await;

        Ok(records
            .into_iter()
            .map(|record| {
                let name = self.names.name_or_placeholder(&record.organization_id);
                OfferView::from_record(record, name)
            })
            .collect())
    }

    fn commit(&self, offers: Vec<OfferView>) {
        info!(count = offers.len(), "offer list refreshed");
        self.update(|state| {
            state.offers = Arc::new(offers);
            state.loading = false;
            state.refreshed_at = Some(Utc::now());
        });
    }

    fn fail(&self, message: String) {
        self.update(|state| {
            state.error = Some(message);
            state.loading = false;
        });
    }
}

/// One page of the filtered, sorted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferPage<'a> {
    pub items: Vec<&'a OfferView>,
    pub total: usize,
    pub has_more: bool,
}

impl OfferPage<'_> {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.items.len())
    }
}

/// Filter criteria plus the "load more" window over the canonical list.
#[derive(Debug, Clone)]
pub struct OfferBrowser {
    criteria: OfferCriteria,
    normalized: NormalizedCriteria,
    page_size: usize,
    visible: usize,
}

impl Default for OfferBrowser {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl OfferBrowser {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            criteria: OfferCriteria::default(),
            normalized: NormalizedCriteria::default(),
            page_size,
            visible: page_size,
        }
    }

    pub fn criteria(&self) -> &OfferCriteria {
        &self.criteria
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// Replaces the criteria. The window resets only if the normalized form changed.
    pub fn set_criteria(&mut self, criteria: OfferCriteria) -> bool {
        let normalized = criteria.normalized();
        self.criteria = criteria;
        if normalized == self.normalized {
            return false;
        }
        self.normalized = normalized;
        self.visible = self.page_size;
        true
    }

    pub fn set_organization_filter(&mut self, value: impl Into<String>) -> bool {
        let criteria = OfferCriteria {
            organization: value.into(),
            ..self.criteria.clone()
        };
        self.set_criteria(criteria)
    }

    pub fn set_title_filter(&mut self, value: impl Into<String>) -> bool {
        let criteria = OfferCriteria {
            title: value.into(),
            ..self.criteria.clone()
        };
        self.set_criteria(criteria)
    }

    pub fn set_sort(&mut self, sort: SortMode) -> bool {
        let criteria = OfferCriteria {
            sort,
            ..self.criteria.clone()
        };
        self.set_criteria(criteria)
    }

    pub fn load_more(&mut self) {
        self.visible += self.page_size;
    }

    pub fn page<'a>(&self, offers: &'a [OfferView]) -> OfferPage<'a> {
        let mut items = self.normalized.apply(offers);
        let total = items.len();
        items.truncate(self.visible);
        OfferPage {
            has_more: self.visible < total,
            items,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OfferRecord;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn record(id: i64, organization_id: &str, published: &str) -> OfferRecord {
        OfferRecord {
            id,
            title: format!("Offer {id}"),
            description: String::new(),
            requirements: String::new(),
            contract_type: "Internship".to_string(),
            location: "Bogotá".to_string(),
            salary: String::new(),
            published_at: Some(published.to_string()),
            closes_at: None,
            status: None,
            organization_id: organization_id.to_string(),
        }
    }

    struct FakeSource {
        offers: Mutex<Result<Vec<OfferRecord>, u16>>,
        names: HashMap<String, String>,
        lookups: AtomicUsize,
    }

    impl FakeSource {
        fn with_offers(offers: Vec<OfferRecord>) -> Self {
            Self {
                offers: Mutex::new(Ok(offers)),
                names: HashMap::new(),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl OfferSource for FakeSource {
        async fn list_offers(&self) -> Result<Vec<OfferRecord>, ApiError> {
            self.offers
                .lock()
                .expect("offers poisoned")
                .clone()
                .map_err(|status| ApiError::from_status(status, "backend down".to_string()))
        }

        async fn organization_name(&self, organization_id: &str) -> Result<String, ApiError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.names
                .get(organization_id)
                .cloned()
                .ok_or_else(|| ApiError::from_status(404, String::new()))
        }
    }

    fn views(count: usize) -> Vec<OfferView> {
        (0..count as i64)
            .map(|id| OfferView {
                title: format!("Offer {id}"),
                ..OfferView::placeholder(id)
            })
            .collect()
    }

    #[tokio::test]
    async fn refresh_resolves_each_organization_once() {
        let mut source = FakeSource::with_offers(vec![
            record(1, "org-1", "2025-01-01"),
            record(2, "org-1", "2025-01-02"),
            record(3, "", "2025-01-03"),
        ]);
        source.names.insert("org-1".to_string(), "Acme".to_string());
        let engine = DiscoveryEngine::new(source);

        assert_eq!(engine.refresh().await, CycleOutcome::Committed);
        assert_eq!(engine.refresh().await, CycleOutcome::Committed);

        let offers = engine.offers();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].organization_name, "Acme");
        assert_eq!(offers[2].organization_name, "Organization");
        assert_eq!(engine.source().lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let engine = DiscoveryEngine::new(FakeSource::with_offers(vec![record(1, "", "2025-01-01")]));
        engine.refresh().await;

        *engine.source().offers.lock().expect("lock") = Err(503);
        assert_eq!(engine.refresh().await, CycleOutcome::Failed);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.offers.len(), 1);
        assert_eq!(snapshot.error.as_deref(), Some("backend down"));
        assert!(!snapshot.loading);
    }

    #[test]
    fn load_more_grows_by_page_size() {
        let offers = views(14);
        let mut browser = OfferBrowser::default();

        let page = browser.page(&offers);
        assert_eq!(page.items.len(), 6);
        assert!(page.has_more);

        browser.load_more();
        browser.load_more();
        let page = browser.page(&offers);
        assert_eq!(page.items.len(), 14);
        assert!(!page.has_more);
        assert_eq!(page.remaining(), 0);
    }

    #[test]
    fn changing_filters_resets_window() {
        let mut browser = OfferBrowser::default();
        browser.load_more();
        assert_eq!(browser.visible_count(), 12);

        assert!(browser.set_title_filter("offer"));
        assert_eq!(browser.visible_count(), 6);

        browser.load_more();
        assert!(!browser.set_title_filter("  OFFER "));
        assert_eq!(browser.visible_count(), 12);

        assert!(browser.set_sort(SortMode::Oldest));
        assert_eq!(browser.visible_count(), 6);
    }
}
