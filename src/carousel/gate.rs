use std::path::Path;
use std::time::Duration;

use chrono::Local;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::blocks;
use crate::config::RunConfig;
use crate::error::TaskError;
use crate::session::{Session, SessionError};

const COOKIE_SEL: &str = "#onetrust-accept-btn-handler";

/// Open the configured page and wait until the SPA has rendered carousel
/// blocks. Retries extend the timeout budget; the last failure triggers a
/// debug screenshot before the error propagates.
pub async fn open_page(session: &dyn Session, config: &RunConfig) -> Result<(), TaskError> {
    let mut last_err = None;
    for attempt in 1..=config.gate_attempts {
        let budget = config.page_timeout + config.retry_extension * (attempt - 1);
        match try_open(session, config, budget).await {
            Ok(()) => {
                if config.full_scroll {
                    let rounds = scroll_to_end(session, config).await?;
                    debug!("Page height settled after {} scroll rounds", rounds);
                }
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "Load attempt {}/{} for {} failed: {}",
                    attempt, config.gate_attempts, config.base_url, err
                );
                last_err = Some(err);
            }
        }
    }
    capture_timeout_screenshot(session, &config.debug_dir).await;
    Err(TaskError::PageNotReady {
        attempts: config.gate_attempts,
        source: last_err.unwrap_or(SessionError::Timeout {
            waited: Duration::ZERO,
            what: "page load".into(),
        }),
    })
}

async fn try_open(
    session: &dyn Session,
    config: &RunConfig,
    budget: Duration,
) -> Result<(), SessionError> {
    session.goto(&config.base_url).await?;
    accept_cookies(session, config.cookie_timeout, config.poll_interval).await;
    wait_blocks(session, budget, config.poll_interval).await
}

/// Dismiss the OneTrust consent banner when it shows up. Consent state is
/// per-session, so a missing banner is the common case and never an error.
async fn accept_cookies(session: &dyn Session, timeout: Duration, poll: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        match session.query(COOKIE_SEL).await {
            Ok(Some(button)) => {
                if button.is_displayed().await.unwrap_or(false) {
                    match button.click().await {
                        Ok(()) => debug!("Cookie banner accepted"),
                        Err(err) => debug!("Cookie banner click failed: {}", err),
                    }
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => {
                debug!("Cookie banner lookup failed: {}", err);
                return;
            }
        }
        if Instant::now() >= deadline {
            return;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Poll until the document is ready and at least one carousel block exists.
pub(crate) async fn wait_blocks(
    session: &dyn Session,
    budget: Duration,
    poll: Duration,
) -> Result<(), SessionError> {
    let deadline = Instant::now() + budget;
    loop {
        if session.document_ready().await? && blocks::count(session).await? > 0 {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(SessionError::Timeout {
                waited: budget,
                what: "carousel blocks".into(),
            });
        }
        tokio::time::sleep(poll).await;
    }
}

/// Scroll to the bottom until the page height stops growing, forcing
/// lazy-loaded sections to mount. Returns the number of scroll rounds spent.
pub async fn scroll_to_end(session: &dyn Session, config: &RunConfig) -> Result<u32, SessionError> {
    let mut last_height = session.scroll_to_bottom().await?;
    let mut rounds = 1;
    while rounds < config.scroll_cap {
        tokio::time::sleep(config.scroll_delay).await;
        let height = session.scroll_to_bottom().await?;
        if height == last_height {
            break;
        }
        last_height = height;
        rounds += 1;
    }
    Ok(rounds)
}

async fn capture_timeout_screenshot(session: &dyn Session, dir: &Path) {
    if let Err(err) = std::fs::create_dir_all(dir) {
        warn!("Could not create {}: {}", dir.display(), err);
        return;
    }
    let path = dir.join(format!("timeout_{}.png", Local::now().format("%H%M%S")));
    match session.screenshot(&path).await {
        Ok(()) => info!("Saved timeout screenshot to {}", path.display()),
        Err(err) => warn!("Could not save timeout screenshot: {}", err),
    }
}

// ── Tests ──
