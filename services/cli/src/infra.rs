use std::sync::Arc;

use job_board::config::{ApiConfig, AppConfig};
use job_board::error::AppError;
use job_board::notify::{Toast, ToastKind, Toasts};
use job_board::session::{AccountKind, SessionUser};
use job_board::{telemetry, JobBoardClient, Queries, SessionContext};
use tracing::debug;

/// Everything a command needs: configuration, the shared session and both client layers.
pub(crate) struct Runtime {
    pub(crate) config: AppConfig,
    pub(crate) session: Arc<SessionContext>,
    pub(crate) client: JobBoardClient,
    pub(crate) queries: Queries,
    pub(crate) toasts: Arc<Toasts>,
}

impl Runtime {
    pub(crate) fn bootstrap(api_url: Option<String>) -> Result<Self, AppError> {
        let mut config = AppConfig::load()?;
        if let Some(url) = api_url {
            config.api = ApiConfig::new(url)?;
        }
        telemetry::init(&config.telemetry)?;

        let session = Arc::new(SessionContext::load(&config.session.path)?);
        let client = JobBoardClient::new(&config.api, Arc::clone(&session));
        let queries = Queries::new(client.clone());
        debug!(api = %config.api.base_url, environment = ?config.environment, "runtime ready");

        Ok(Self {
            config,
            session,
            client,
            queries,
            toasts: Arc::new(Toasts::new()),
        })
    }

    pub(crate) fn require(&self, kind: AccountKind) -> Result<SessionUser, AppError> {
        match self.session.user() {
            Some(user) if user.kind == kind => Ok(user),
            Some(user) => Err(AppError::Input(format!(
                "this command needs a {} account; signed in as {} ({})",
                kind.label(),
                user.email,
                user.kind.label()
            ))),
            None => Err(AppError::Input(
                "not signed in; run `job-board login` first".to_string(),
            )),
        }
    }

    /// Prints and drops the notifications raised by the last action.
    pub(crate) fn flush_toasts(&self) {
        for toast in self.toasts.active() {
            print_toast(&toast);
            self.toasts.dismiss(toast.id);
        }
    }
}

fn print_toast(toast: &Toast) {
    match toast.kind {
        ToastKind::Success => println!("[ok] {}", toast.message),
        ToastKind::Error => eprintln!("[error] {}", toast.message),
    }
}
