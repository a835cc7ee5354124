//! Offer discovery: polling, name resolution, filtering, pagination and apply state.

pub mod engine;
pub mod export;
pub mod filter;
pub mod history;
pub mod names;
pub mod refresh;
pub mod source;
pub mod submission;
pub mod view;

pub use engine::{DiscoveryEngine, DiscoverySnapshot, OfferBrowser, OfferPage};
pub use export::write_offers_csv;
pub use filter::{normalize_text, sort_key, OfferCriteria, SortMode};
pub use history::{ApplicationHistory, ApplicationSummary, HistorySnapshot};
pub use names::OrganizationNames;
pub use refresh::{
    refresh_once, spawn_refresh_loop, CycleOutcome, Refresh, RefreshHandle, RefreshTrigger,
};
pub use source::{ApplicationSource, OfferSource};
pub use submission::{ApplicationGateway, ApplicationTracker, ApplyAffordance, SubmissionOutcome};
pub use view::{OfferView, ORGANIZATION_PLACEHOLDER};
