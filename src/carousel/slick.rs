use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::session::{Element, SessionError};

pub(crate) const SLIDE_SEL: &str = "app-slide";
pub(crate) const NEXT_SEL: &str = ".slick-next.slick-arrow";
pub(crate) const DISABLED_CLASS: &str = "slick-disabled";
pub(crate) const CLONE_CLASS: &str = "slick-cloned";
/// Name span read during enumeration; only in-window slides yield text.
pub(crate) const NAME_SEL: &str = "h3 span[aria-hidden='true']";
/// Looser variant used when re-finding a card after a reload.
pub(crate) const NAME_ANY_SEL: &str = "h3 span[aria-hidden]";

/// One card of a slick carousel, identified by its visible name only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlickCard {
    pub order: usize,
    pub label: String,
}

/// List the cards of a slick block. Slick only exposes the text of the
/// slides inside its window, so the scan pages right between passes and
/// stops once a pass adds nothing, the arrow dies, or `scan_cap` is spent.
pub async fn enumerate(
    block: &dyn Element,
    scan_cap: u32,
    scan_delay: Duration,
) -> Result<Vec<SlickCard>, SessionError> {
    let mut seen = HashSet::new();
    let mut labels: Vec<String> = Vec::new();
    let mut previous_total: Option<usize> = None;

    for _ in 0..scan_cap {
        for slide in block.query_all(SLIDE_SEL).await? {
            let class = slide.attr("class").await?.unwrap_or_default();
            if class.contains(CLONE_CLASS) {
                continue;
            }
            let Some(span) = slide.query(NAME_SEL).await? else {
                continue;
            };
            let name = span.text().await?.trim().to_string();
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            labels.push(name);
        }
        if previous_total == Some(labels.len()) {
            break;
        }
        previous_total = Some(labels.len());

        let Some(next) = block.query(NEXT_SEL).await? else {
            break;
        };
        let next_class = next.attr("class").await?.unwrap_or_default();
        if next_class.contains(DISABLED_CLASS) {
            break;
        }
        next.click().await?;
        tokio::time::sleep(scan_delay).await;
    }

    Ok(labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| SlickCard { order: i + 1, label })
        .collect())
}

// ── Tests ──
