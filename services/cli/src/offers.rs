use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use job_board::api::OfferId;
use job_board::discovery::{
    spawn_refresh_loop, write_offers_csv, ApplicationHistory, ApplicationTracker, CycleOutcome,
    DiscoveryEngine, OfferBrowser, OfferCriteria, OfferView, SortMode, SubmissionOutcome,
};
use job_board::error::AppError;
use job_board::session::AccountKind;
use job_board::{JobBoardClient, Queries};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::account::or_dash;
use crate::infra::Runtime;

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FilterArgs {
    /// Organization name filter (accent and case insensitive)
    #[arg(long)]
    pub(crate) organization: Option<String>,
    /// Title filter (accent and case insensitive)
    #[arg(long)]
    pub(crate) title: Option<String>,
    /// default, newest or oldest
    #[arg(long, default_value = "default")]
    pub(crate) sort: SortMode,
}

impl FilterArgs {
    fn criteria(&self) -> OfferCriteria {
        OfferCriteria {
            organization: self.organization.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            sort: self.sort,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// How many pages of results to show
    #[arg(long, default_value_t = 1)]
    pub(crate) pages: usize,
    /// Emit the page as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Override the configured refresh interval, in seconds
    #[arg(long)]
    pub(crate) every: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    /// Offer id
    pub(crate) offer_id: OfferId,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Destination file; stdout when omitted
    #[arg(long, short)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn list(runtime: &Runtime, args: ListArgs) -> Result<(), AppError> {
    let engine = load_offers(&runtime.client).await?;
    let offers = engine.offers();

    let mut browser = OfferBrowser::new(runtime.config.discovery.page_size);
    browser.set_criteria(args.filter.criteria());
    for _ in 1..args.pages.max(1) {
        browser.load_more();
    }
    let page = browser.page(&offers);

    if args.json {
        let body = serde_json::to_string_pretty(&page.items)
            .map_err(|err| AppError::Input(format!("could not render offers: {err}")))?;
        println!("{body}");
        return Ok(());
    }

    let tracker = student_tracker(runtime).await?;
    println!("{} of {} offers", page.items.len(), page.total);
    for offer in &page.items {
        print_offer(offer);
        if let Some(tracker) = &tracker {
            println!("    [{}]", tracker.affordance(offer.id).label());
        }
    }
    if page.has_more {
        println!("... {} more (use --pages)", page.remaining());
    }
    Ok(())
}

pub(crate) async fn watch(runtime: &Runtime, args: WatchArgs) -> Result<(), AppError> {
    let period = args
        .every
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(runtime.config.discovery.refresh_interval);
    let engine = Arc::new(DiscoveryEngine::new(runtime.client.clone()));
    let handle = spawn_refresh_loop(Arc::clone(&engine), period);
    let criteria = args.filter.criteria().normalized();
    info!(period_secs = period.as_secs(), "watching offers");
    println!("Watching offers every {}s; press Enter to refresh now, Ctrl-C to stop", period.as_secs());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut seen = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if wants_refresh(&line) => {
                    if !handle.refresh_now() {
                        debug!("refresh already pending");
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!(error = %err, "stdin closed; manual refresh disabled");
                    stdin_open = false;
                }
            },
            _ = ticker.tick() => {
                let snapshot = engine.snapshot();
                if snapshot.refreshed_at.is_none() || snapshot.refreshed_at == seen {
                    continue;
                }
                seen = snapshot.refreshed_at;
                let matching = criteria.apply(&snapshot.offers);
                let stamp = seen
                    .map(|at| at.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                match &snapshot.error {
                    Some(error) => println!("{stamp}  refresh failed: {error}"),
                    None => println!("{stamp}  {} offers ({} matching)", snapshot.offers.len(), matching.len()),
                }
                for offer in matching.iter().take(runtime.config.discovery.page_size) {
                    print_offer(offer);
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// A bare Enter or `r` asks for an immediate refresh.
fn wants_refresh(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.eq_ignore_ascii_case("r")
}

pub(crate) async fn apply(runtime: &Runtime, args: ApplyArgs) -> Result<(), AppError> {
    runtime.require(AccountKind::Student)?;
    let tracker = student_tracker(runtime)
        .await?
        .ok_or_else(|| AppError::Input("sign in as a student to apply".to_string()))?;

    let outcome = tracker.submit(args.offer_id).await;
    runtime.flush_toasts();
    match outcome {
        SubmissionOutcome::Submitted => Ok(()),
        SubmissionOutcome::AlreadyApplied => {
            println!("Already applied to offer {}", args.offer_id);
            Ok(())
        }
        SubmissionOutcome::InFlight => Ok(()),
        SubmissionOutcome::SignInRequired => Err(AppError::Input(
            "sign in as a student to apply".to_string(),
        )),
        SubmissionOutcome::Failed(message) => Err(AppError::Input(message)),
    }
}

pub(crate) async fn export(runtime: &Runtime, args: ExportArgs) -> Result<(), AppError> {
    let engine = load_offers(&runtime.client).await?;
    let offers = engine.offers();
    let matching = args.filter.criteria().normalized().apply(&offers);

    match &args.output {
        Some(path) => {
            write_offers_csv(File::create(path)?, matching.iter().copied())?;
            println!("Wrote {} offers to {}", matching.len(), path.display());
        }
        None => write_offers_csv(io::stdout().lock(), matching.iter().copied())?,
    }
    Ok(())
}

pub(crate) async fn applications(runtime: &Runtime) -> Result<(), AppError> {
    let user = runtime.require(AccountKind::Student)?;
    let history = ApplicationHistory::new(runtime.client.clone(), user.id);
    if history.refresh().await == CycleOutcome::Failed {
        let error = history.snapshot().error.unwrap_or_default();
        return Err(AppError::Input(format!("could not load applications: {error}")));
    }

    let snapshot = history.snapshot();
    if snapshot.applications.is_empty() {
        println!("No applications yet");
        return Ok(());
    }
    for application in snapshot.applications.iter() {
        println!(
            "#{:<5} {:<40} {:<30} {:<10} {}",
            application.id,
            application.offer_title,
            application.organization_name,
            application.status,
            application.submitted
        );
    }
    Ok(())
}

async fn load_offers(client: &JobBoardClient) -> Result<DiscoveryEngine<JobBoardClient>, AppError> {
    let engine = DiscoveryEngine::new(client.clone());
    if engine.refresh().await == CycleOutcome::Failed {
        let error = engine.snapshot().error.unwrap_or_default();
        return Err(AppError::Input(format!("could not load offers: {error}")));
    }
    Ok(engine)
}

/// Tracker seeded with the signed-in student's existing applications.
async fn student_tracker(
    runtime: &Runtime,
) -> Result<Option<ApplicationTracker<Queries>>, AppError> {
    let Ok(user) = runtime.require(AccountKind::Student) else {
        return Ok(None);
    };
    let existing = runtime
        .queries
        .student_applications(&user.id)
        .await?
        .unwrap_or_default();
    let tracker = ApplicationTracker::new(
        runtime.queries.clone(),
        Arc::clone(&runtime.session),
        Arc::clone(&runtime.toasts),
    );
    tracker.seed_applied(&existing);
    Ok(Some(tracker))
}

fn print_offer(offer: &OfferView) {
    println!("#{:<5} {}", offer.id, offer.title);
    println!(
        "    {} | {} | {} | {}",
        offer.organization_name,
        or_dash(&offer.location),
        or_dash(&offer.contract_type),
        offer.posted
    );
}

#[cfg(test)]
mod tests {
    use super::wants_refresh;

    #[test]
    fn enter_or_r_requests_a_refresh() {
        assert!(wants_refresh(""));
        assert!(wants_refresh("  \r"));
        assert!(wants_refresh("R"));
        assert!(!wants_refresh("quit"));
    }
}
