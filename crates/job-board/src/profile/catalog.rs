use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::api::{Career, UniversityId};
use crate::http::ApiError;

pub trait CatalogSource: Send + Sync {
    fn careers_for(
        &self,
        university_id: UniversityId,
    ) -> impl Future<Output = Result<Vec<Career>, ApiError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLoad {
    Loaded(Arc<Vec<Career>>),
    Cached(Arc<Vec<Career>>),
    /// Another caller is already loading this university.
    InProgress,
}

#[derive(Debug, Default)]
struct CatalogState {
    careers: HashMap<UniversityId, Arc<Vec<Career>>>,
    loading: HashSet<UniversityId>,
}

/// Per-university program lists, loaded on demand and kept for the editor's lifetime.
#[derive(Debug)]
pub struct CareerCatalog<C> {
    source: C,
    state: Mutex<CatalogState>,
}

impl<C: CatalogSource> CareerCatalog<C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            state: Mutex::new(CatalogState::default()),
        }
    }

    pub async fn load(&self, university_id: UniversityId) -> Result<CatalogLoad, ApiError> {
        {
            let mut state = self.lock();
            if let Some(careers) = state.careers.get(&university_id) {
                return Ok(CatalogLoad::Cached(Arc::clone(careers)));
            }
            if !state.loading.insert(university_id) {
                return Ok(CatalogLoad::InProgress);
            }
        }

        let result = self.source.careers_for(university_id).await;

        let mut state = self.lock();
        state.loading.remove(&university_id);
        match result {
            Ok(careers) => {
                let careers = Arc::new(careers);
                state.careers.insert(university_id, Arc::clone(&careers));
                Ok(CatalogLoad::Loaded(careers))
            }
            Err(err) => {
                warn!(university = university_id, error = %err, "could not load programs");
                Err(err)
            }
        }
    }

    pub fn is_loading(&self, university_id: UniversityId) -> bool {
        self.lock().loading.contains(&university_id)
    }

    pub fn careers(&self, university_id: UniversityId) -> Option<Arc<Vec<Career>>> {
        self.lock().careers.get(&university_id).cloned()
    }

    /// Programs at `level`; every program when the level is empty or matches none.
    pub fn careers_for_level(&self, university_id: UniversityId, level: &str) -> Vec<Career> {
        let Some(careers) = self.careers(university_id) else {
            return Vec::new();
        };
        filter_by_level(&careers, level)
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn filter_by_level(careers: &[Career], level: &str) -> Vec<Career> {
    if level.is_empty() {
        return careers.to_vec();
    }
    let matching: Vec<Career> = careers
        .iter()
        .filter(|career| career.level == level)
        .cloned()
        .collect();
    if matching.is_empty() {
        careers.to_vec()
    } else {
        matching
    }
}
