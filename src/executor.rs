use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::carousel::{blocks, gate, slick, swiper, CardIdentity};
use crate::config::RunConfig;
use crate::error::TaskError;
use crate::plan::{NavigationTask, TaskAction};
use crate::rows::{derive_path, ResultRow, SHOW_MORE_LABEL};
use crate::session::{Element, Session, SessionProvider};

/// Run stats returned after the task loop completes.
pub struct ExecutionReport {
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Execute the planned navigations one by one, each on a freshly acquired
/// session. A failed task is logged and skipped; the loop itself only stops
/// on cancellation or when the provider cannot hand out sessions anymore.
pub async fn run_tasks(
    provider: &dyn SessionProvider,
    config: &RunConfig,
    tasks: &[NavigationTask],
    cancel: &AtomicBool,
) -> Result<(Vec<ResultRow>, ExecutionReport)> {
    let pb = ProgressBar::new(tasks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut rows = Vec::new();
    let mut report = ExecutionReport {
        attempted: 0,
        completed: 0,
        failed: 0,
        cancelled: false,
    };

    for task in tasks {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            warn!(
                "Run cancelled after {} of {} tasks",
                report.attempted,
                tasks.len()
            );
            break;
        }
        report.attempted += 1;

        let session = provider.acquire().await?;
        let outcome = resolve_task(session.as_ref(), config, task).await;
        if let Err(err) = provider.release(session).await {
            warn!("Session release failed: {}", err);
        }

        match outcome {
            Ok(row) => {
                rows.push(row);
                report.completed += 1;
            }
            Err(err) => {
                report.failed += 1;
                warn!("Task failed for {}: {}", task.describe(), err);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Executed {} tasks ({} ok, {} failed)",
        report.attempted, report.completed, report.failed
    );

    Ok((rows, report))
}

/// One full navigation: open the page, re-find the block, perform the
/// action, record where it led and return to the start page.
async fn resolve_task(
    session: &dyn Session,
    config: &RunConfig,
    task: &NavigationTask,
) -> Result<ResultRow, TaskError> {
    gate::open_page(session, config).await?;
    let block = blocks::locate(session, task.carousel_index).await?;
    block.scroll_into_view().await?;
    check_block_title(block.as_ref(), task).await;

    let resolved_url = match &task.action {
        TaskAction::ShowMore => follow_show_more(session, config, block.as_ref()).await?,
        TaskAction::OpenCard { label, identity, .. } => match identity {
            CardIdentity::Swiper { slide_index } => {
                activate_swiper_card(session, config, block.as_ref(), *slide_index, label).await?
            }
            CardIdentity::Slick { label } => {
                activate_slick_card(session, config, block.as_ref(), label).await?
            }
        },
    };

    let path = derive_path(&resolved_url, &config.host_marker);
    if resolved_url != config.base_url {
        go_back(session, config).await;
    }

    Ok(ResultRow {
        carousel_index: task.carousel_index,
        kind: task.kind,
        block_title: task.block_title.clone(),
        order: task.order(),
        card_label: task.card_label().to_string(),
        resolved_url,
        path,
    })
}

/// Indexes are positional, so a page that reordered its blocks between the
/// survey and this load would silently point the task elsewhere. Detect the
/// drift by title and warn; the run keeps the planned attribution.
async fn check_block_title(block: &dyn Element, task: &NavigationTask) {
    match blocks::classify(block, task.carousel_index).await {
        Ok(current) => {
            if current.title != task.block_title {
                warn!(
                    "Block {} title drifted: planned {:?}, found {:?}",
                    task.carousel_index, task.block_title, current.title
                );
            }
        }
        Err(err) => debug!("Block title check failed: {}", err),
    }
}

async fn follow_show_more(
    session: &dyn Session,
    config: &RunConfig,
    block: &dyn Element,
) -> Result<String, TaskError> {
    let link = blocks::find_show_more(block)
        .await?
        .ok_or_else(|| TaskError::CardNotFound {
            target: SHOW_MORE_LABEL.into(),
            iterations: 0,
        })?;

    let before = session.current_url().await?;
    activate_element(link.as_ref(), SHOW_MORE_LABEL).await?;
    wait_for_url_change(session, &before, config.nav_timeout, config.poll_interval).await;
    tokio::time::sleep(config.show_more_settle).await;
    Ok(session.current_url().await?)
}

async fn activate_swiper_card(
    session: &dyn Session,
    config: &RunConfig,
    block: &dyn Element,
    slide_index: i64,
    label: &str,
) -> Result<String, TaskError> {
    let slide = find_swiper_slide(block, slide_index, label, config).await?;
    let target = click_target(slide).await?;

    let before = session.current_url().await?;
    activate_element(target.as_ref(), label).await?;
    wait_for_url_change(session, &before, config.nav_timeout, config.poll_interval).await;
    tokio::time::sleep(config.card_settle).await;
    Ok(session.current_url().await?)
}

async fn activate_slick_card(
    session: &dyn Session,
    config: &RunConfig,
    block: &dyn Element,
    label: &str,
) -> Result<String, TaskError> {
    let slide = find_slick_slide(block, label, config).await?;
    let target = click_target(slide).await?;

    let before = session.current_url().await?;
    activate_element(target.as_ref(), label).await?;
    wait_for_url_change(session, &before, config.nav_timeout, config.poll_interval).await;
    tokio::time::sleep(config.card_settle).await;
    Ok(session.current_url().await?)
}

/// Advance the carousel one step at a time until the slide with the
/// recorded index is the active one. The next arrow can be absent while
/// swiper initializes; a missing arrow just waits out the step.
async fn find_swiper_slide(
    block: &dyn Element,
    slide_index: i64,
    label: &str,
    config: &RunConfig,
) -> Result<Box<dyn Element>, TaskError> {
    let mut steps = 0;
    loop {
        if let Some(active) = block.query(swiper::ACTIVE_SEL).await? {
            let index_attr = active.attr("data-swiper-slide-index").await?;
            if index_attr.and_then(|v| v.trim().parse::<i64>().ok()) == Some(slide_index) {
                return Ok(active);
            }
        }

        if steps >= config.swiper_step_cap {
            break;
        }
        if let Some(next) = block.query(swiper::NEXT_SEL).await? {
            next.click().await?;
        }
        steps += 1;
        tokio::time::sleep(config.swiper_advance_delay).await;
    }
    Err(TaskError::CardNotFound {
        target: label.into(),
        iterations: steps,
    })
}

/// Re-find a slick card by name. Off-window slides read as empty text, so
/// the scan pages right until the name shows up inside the window. A slide
/// that matches but is still marked aria-hidden keeps the scan going.
async fn find_slick_slide(
    block: &dyn Element,
    label: &str,
    config: &RunConfig,
) -> Result<Box<dyn Element>, TaskError> {
    let mut steps = 0;
    loop {
        let mut hidden_match = false;
        for slide in block.query_all(slick::SLIDE_SEL).await? {
            let class = slide.attr("class").await?.unwrap_or_default();
            if class.contains(slick::CLONE_CLASS) {
                continue;
            }
            let Some(span) = slide.query(slick::NAME_ANY_SEL).await? else {
                continue;
            };
            if span.text().await?.trim() != label {
                continue;
            }
            if slide.attr("aria-hidden").await?.as_deref() != Some("true") {
                return Ok(slide);
            }
            hidden_match = true;
        }
        if hidden_match {
            debug!("Card {:?} matched but still outside the slick window", label);
        }

        if steps >= config.slick_step_cap {
            break;
        }
        let Some(next) = block.query(slick::NEXT_SEL).await? else {
            break;
        };
        let next_class = next.attr("class").await?.unwrap_or_default();
        if next_class.contains(slick::DISABLED_CLASS) {
            break;
        }
        next.click().await?;
        steps += 1;
        tokio::time::sleep(config.slick_advance_delay).await;
    }
    Err(TaskError::CardNotFound {
        target: label.into(),
        iterations: steps,
    })
}

/// The element that actually receives the click: an inner anchor when the
/// card has one, else its role=link overlay, else the slide itself.
async fn click_target(slide: Box<dyn Element>) -> Result<Box<dyn Element>, TaskError> {
    if let Some(anchor) = slide.query("a").await? {
        return Ok(anchor);
    }
    if let Some(overlay) = slide.query("div[role='link']").await? {
        return Ok(overlay);
    }
    Ok(slide)
}

/// Strip the target attribute so the click stays in this tab, then scroll
/// the element in and click it.
async fn activate_element(element: &dyn Element, target: &str) -> Result<(), TaskError> {
    let attempt = async {
        element.remove_attr("target").await?;
        element.scroll_into_view().await?;
        element.click().await
    };
    attempt.await.map_err(|source| TaskError::ActivationFailed {
        target: target.into(),
        source,
    })
}

/// SPA activations may or may not change the address bar; give them a
/// bounded window and move on either way.
async fn wait_for_url_change(session: &dyn Session, before: &str, timeout: Duration, poll: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        match session.current_url().await {
            Ok(url) if url != before => return,
            Ok(_) => {}
            Err(err) => {
                debug!("URL poll failed: {}", err);
                return;
            }
        }
        if Instant::now() >= deadline {
            debug!("URL unchanged after {:?}", timeout);
            return;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Best-effort return to the start page; the next task reloads it anyway.
async fn go_back(session: &dyn Session, config: &RunConfig) {
    if let Err(err) = session.back().await {
        debug!("history.back failed: {}", err);
        return;
    }
    if let Err(err) = gate::wait_blocks(session, config.back_timeout, config.poll_interval).await {
        debug!("Blocks not back after return: {}", err);
    }
}

// ── Tests ──
