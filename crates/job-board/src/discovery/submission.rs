//! Per-offer apply state and the create-application flow.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::api::{ApplicationRecord, NewApplication, OfferId};
use crate::http::ApiError;
use crate::notify::Toasts;
use crate::session::{AccountKind, SessionContext};

pub const SUBMITTED_MESSAGE: &str = "Application sent successfully";

/// Write side used by [`ApplicationTracker`].
pub trait ApplicationGateway: Send + Sync {
    fn submit_application(
        &self,
        application: &NewApplication,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// What the apply control for one offer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAffordance {
    Applied,
    Submitting,
    SignInRequired,
    Available,
}

impl ApplyAffordance {
    pub const fn label(self) -> &'static str {
        match self {
            ApplyAffordance::Applied => "Applied",
            ApplyAffordance::Submitting => "Applying...",
            ApplyAffordance::SignInRequired => "Sign in to apply",
            ApplyAffordance::Available => "Apply",
        }
    }

    pub const fn is_enabled(self) -> bool {
        matches!(self, ApplyAffordance::Available)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted,
    /// Already in the applied set; nothing was sent.
    AlreadyApplied,
    /// A request for this offer is still pending; nothing was sent.
    InFlight,
    /// No signed-in student; nothing was sent.
    SignInRequired,
    Failed(String),
}

#[derive(Debug, Default)]
struct TrackerState {
    applying: Option<OfferId>,
    in_flight: BTreeSet<OfferId>,
    applied: BTreeSet<OfferId>,
}

/// Tracks the "applying" marker and the applied set, and drives submissions.
#[derive(Debug)]
pub struct ApplicationTracker<G> {
    gateway: G,
    session: Arc<SessionContext>,
    toasts: Arc<Toasts>,
    state: Mutex<TrackerState>,
}

impl<G: ApplicationGateway> ApplicationTracker<G> {
    pub fn new(gateway: G, session: Arc<SessionContext>, toasts: Arc<Toasts>) -> Self {
        Self {
            gateway,
            session,
            toasts,
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Marks offers the student already applied to, e.g. from the server's list.
    pub fn seed_applied<'a, I>(&self, applications: I)
    where
        I: IntoIterator<Item = &'a ApplicationRecord>,
    {
        let mut state = self.lock();
        state
            .applied
            .extend(applications.into_iter().map(|application| application.offer_id));
    }

    pub fn applied(&self) -> BTreeSet<OfferId> {
        self.lock().applied.clone()
    }

    pub fn is_applied(&self, offer_id: OfferId) -> bool {
        self.lock().applied.contains(&offer_id)
    }

    /// The most recently requested submission still in flight.
    pub fn applying(&self) -> Option<OfferId> {
        self.lock().applying
    }

    pub fn affordance(&self, offer_id: OfferId) -> ApplyAffordance {
        let state = self.lock();
        if state.applied.contains(&offer_id) {
            ApplyAffordance::Applied
        } else if state.applying == Some(offer_id) {
            ApplyAffordance::Submitting
        } else if !self.session.is_authenticated() {
            ApplyAffordance::SignInRequired
        } else {
            ApplyAffordance::Available
        }
    }

    pub async fn submit(&self, offer_id: OfferId) -> SubmissionOutcome {
        let student_id = match self.session.user() {
            Some(user) if user.kind == AccountKind::Student => user.id,
            _ => return SubmissionOutcome::SignInRequired,
        };

        {
            let mut state = self.lock();
            if state.applied.contains(&offer_id) {
                return SubmissionOutcome::AlreadyApplied;
            }
            if !state.in_flight.insert(offer_id) {
                return SubmissionOutcome::InFlight;
            }
            state.applying = Some(offer_id);
        }

        let application = NewApplication {
            student_id,
            offer_id,
        };
        let result = self.gateway.submit_application(&application).await;

        let mut state = self.lock();
        state.in_flight.remove(&offer_id);
        if state.applying == Some(offer_id) {
            state.applying = None;
        }
        match result {
            Ok(()) => {
                state.applied.insert(offer_id);
                drop(state);
                info!(offer = offer_id, "application submitted");
                self.toasts.success(SUBMITTED_MESSAGE);
                SubmissionOutcome::Submitted
            }
            Err(err) => {
                drop(state);
                let message = err.to_string();
                warn!(offer = offer_id, error = %message, "application failed");
                self.toasts.error(message.clone());
                SubmissionOutcome::Failed(message)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastKind;
    use crate::session::SessionUser;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    struct FakeGateway {
        calls: AtomicUsize,
        fail_with: Option<&'static str>,
    }

    impl ApplicationGateway for FakeGateway {
        async fn submit_application(&self, _application: &NewApplication) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(body) => Err(ApiError::from_status(409, body.to_string())),
                None => Ok(()),
            }
        }
    }

    fn signed_in_student() -> Arc<SessionContext> {
        let session = SessionContext::in_memory();
        session
            .establish(
                "token".to_string(),
                SessionUser {
                    id: "1032".to_string(),
                    email: "laura@uni.edu.co".to_string(),
                    name: "LAURA".to_string(),
                    kind: AccountKind::Student,
                },
            )
            .expect("in-memory session");
        Arc::new(session)
    }

    fn tracker(fail_with: Option<&'static str>) -> ApplicationTracker<FakeGateway> {
        ApplicationTracker::new(
            FakeGateway {
                calls: AtomicUsize::new(0),
                fail_with,
            },
            signed_in_student(),
            Arc::new(Toasts::new()),
        )
    }

    #[tokio::test]
    async fn successful_submission_marks_offer_applied() {
        let tracker = tracker(None);
        assert_eq!(tracker.affordance(42), ApplyAffordance::Available);

        assert_eq!(tracker.submit(42).await, SubmissionOutcome::Submitted);
        assert_eq!(tracker.affordance(42), ApplyAffordance::Applied);
        assert_eq!(tracker.applying(), None);
        assert_eq!(tracker.toasts().active()[0].kind, ToastKind::Success);
    }

    #[tokio::test]
    async fn applied_offers_never_resubmit() {
        let tracker = tracker(None);
        tracker.submit(42).await;
        assert_eq!(tracker.submit(42).await, SubmissionOutcome::AlreadyApplied);
        assert_eq!(tracker.gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_clears_marker_and_reports_message() {
        let tracker = tracker(Some("Ya te postulaste a esta oferta"));
        let outcome = tracker.submit(7).await;

        assert_eq!(
            outcome,
            SubmissionOutcome::Failed("Ya te postulaste a esta oferta".to_string())
        );
        assert_eq!(tracker.applying(), None);
        assert!(!tracker.is_applied(7));
        assert_eq!(tracker.toasts().active()[0].kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn signed_out_users_cannot_apply() {
        let tracker = ApplicationTracker::new(
            FakeGateway {
                calls: AtomicUsize::new(0),
                fail_with: None,
            },
            Arc::new(SessionContext::in_memory()),
            Arc::new(Toasts::new()),
        );
        assert_eq!(tracker.affordance(1), ApplyAffordance::SignInRequired);
        assert_eq!(tracker.submit(1).await, SubmissionOutcome::SignInRequired);
        assert_eq!(tracker.gateway.calls.load(Ordering::SeqCst), 0);
    }

    /// Holds each submission open until its offer's gate is released.
    struct GatedGateway {
        calls: AtomicUsize,
        gates: Mutex<HashMap<OfferId, oneshot::Receiver<()>>>,
    }

    impl ApplicationGateway for GatedGateway {
        async fn submit_application(&self, application: &NewApplication) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self
                .gates
                .lock()
                .expect("gates poisoned")
                .remove(&application.offer_id);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(())
        }
    }

    async fn wait_for_calls(tracker: &ApplicationTracker<GatedGateway>, expected: usize) {
        while tracker.gateway.calls.load(Ordering::SeqCst) < expected {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn marker_tracks_the_most_recent_of_overlapping_submissions() {
        let (release_first, first_gate) = oneshot::channel();
        let (release_second, second_gate) = oneshot::channel();
        let tracker = Arc::new(ApplicationTracker::new(
            GatedGateway {
                calls: AtomicUsize::new(0),
                gates: Mutex::new(HashMap::from([(1, first_gate), (2, second_gate)])),
            },
            signed_in_student(),
            Arc::new(Toasts::new()),
        ));

        let first = tokio::spawn({
            let tracker = Arc::clone(&tracker);
            async move { tracker.submit(1).await }
        });
        wait_for_calls(&tracker, 1).await;
        assert_eq!(tracker.applying(), Some(1));

        let second = tokio::spawn({
            let tracker = Arc::clone(&tracker);
            async move { tracker.submit(2).await }
        });
        wait_for_calls(&tracker, 2).await;
        assert_eq!(tracker.applying(), Some(2));
        assert_eq!(tracker.affordance(2), ApplyAffordance::Submitting);

        assert_eq!(tracker.submit(1).await, SubmissionOutcome::InFlight);
        assert_eq!(tracker.gateway.calls.load(Ordering::SeqCst), 2);

        release_first.send(()).expect("first still pending");
        assert_eq!(first.await.expect("first joins"), SubmissionOutcome::Submitted);
        assert_eq!(tracker.applying(), Some(2));
        assert!(tracker.is_applied(1));

        release_second.send(()).expect("second still pending");
        assert_eq!(second.await.expect("second joins"), SubmissionOutcome::Submitted);
        assert_eq!(tracker.applying(), None);
        assert_eq!(tracker.applied().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn seeded_applications_disable_the_control() {
        let tracker = tracker(None);
        let record: ApplicationRecord = serde_json::from_value(serde_json::json!({
            "id_postulacion": 1,
            "id_num": "1032",
            "id_oferta": 5
        }))
        .expect("decodes");
        tracker.seed_applied([&record]);
        assert!(!tracker.affordance(5).is_enabled());
    }
}
