use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use futures::future::join_all;
use tracing::warn;

use super::source::OfferSource;
use super::view::ORGANIZATION_PLACEHOLDER;

/// Organization id to display name, memoized for the owner's lifetime.
///
/// Failed lookups are stored as the placeholder and never retried.
#[derive(Debug, Default)]
pub struct OrganizationNames {
    names: RwLock<HashMap<String, String>>,
}

impl OrganizationNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, organization_id: &str) -> Option<String> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(organization_id)
            .cloned()
    }

    pub fn name_or_placeholder(&self, organization_id: &str) -> String {
        self.get(organization_id)
            .unwrap_or_else(|| ORGANIZATION_PLACEHOLDER.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up every distinct, non-empty, unknown id in parallel. Returns how many were added.
    pub async fn resolve_missing<'a, S, I>(&self, source: &S, organization_ids: I) -> usize
    where
        S: OfferSource,
        I: IntoIterator<Item = &'a str>,
    {
        let missing: BTreeSet<String> = {
            let names = self.names.read().unwrap_or_else(PoisonError::into_inner);
            organization_ids
                .into_iter()
                .filter(|id| !id.is_empty() && !names.contains_key(*id))
                .map(str::to_string)
                .collect()
        };
        if missing.is_empty() {
            return 0;
        }

        let lookups = missing.iter().map(|id| async move {
            let name = match source.organization_name(id).await {
                Ok(name) => name,
                Err(err) => {
                    warn!(organization = %id, error = %err, "organization lookup failed; using placeholder");
                    ORGANIZATION_PLACEHOLDER.to_string()
                }
            };
            (id.clone(), name)
        });
        let resolved = join_all(lookups).await;

        let mut names = self.names.write().unwrap_or_else(PoisonError::into_inner);
        let added = resolved.len();
        names.extend(resolved);
        added
    }
}
