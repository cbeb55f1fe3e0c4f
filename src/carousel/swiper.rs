use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::session::{Element, SessionError};

pub(crate) const SLIDE_SEL: &str = "swiper-slide";
pub(crate) const ACTIVE_SEL: &str = "swiper-slide.swiper-slide-active";
pub(crate) const NEXT_SEL: &str = ".ic-arrow-right-bg";

/// Pagination ghosts like "1 / 12" that swiper leaves in aria labels.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s/]+$").unwrap());

/// One unique card of a swiper carousel. `slide_index` is the value of
/// data-swiper-slide-index, which survives a page reload; `order` is the
/// 1-based position among kept cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwiperCard {
    pub order: usize,
    pub slide_index: i64,
    pub label: String,
}

/// List the unique cards of a swiper block in DOM order. Loop duplicates,
/// slides without a swiper index and slides with no usable label are
/// skipped; the first slide wins when two share a label.
pub async fn enumerate(block: &dyn Element, title: &str) -> Result<Vec<SwiperCard>, SessionError> {
    let mut seen = HashSet::new();
    let mut cards = Vec::new();
    for slide in block.query_all(SLIDE_SEL).await? {
        let class = slide.attr("class").await?.unwrap_or_default();
        if class.contains("-duplicate") {
            continue;
        }
        let index_attr = slide.attr("data-swiper-slide-index").await?;
        let Some(slide_index) = index_attr.and_then(|v| v.trim().parse::<i64>().ok()) else {
            debug!("Swiper slide without a numeric index attribute, skipping");
            continue;
        };
        let Some(label) = resolve_label(slide.as_ref(), title).await? else {
            debug!("Swiper slide {} has no usable label, skipping", slide_index);
            continue;
        };
        if !seen.insert(label.clone()) {
            continue;
        }
        cards.push(SwiperCard {
            order: cards.len() + 1,
            slide_index,
            label,
        });
    }
    Ok(cards)
}

/// Resolve a card label: slide aria-label, else the inner role=link
/// aria-label, else the first heading or aria-hidden span with real text.
async fn resolve_label(slide: &dyn Element, title: &str) -> Result<Option<String>, SessionError> {
    let mut label = trimmed(slide.attr("aria-label").await?);
    if unusable(&label) {
        if let Some(link) = slide.query("div[role='link'][aria-label]").await? {
            label = trimmed(link.attr("aria-label").await?);
        }
    }
    if unusable(&label) {
        for heading in slide.query_all("span[aria-hidden], h2, h3").await? {
            let text = heading.text().await?.trim().to_string();
            if !unusable(&text) {
                label = text;
                break;
            }
        }
    }
    if unusable(&label) {
        return Ok(None);
    }
    Ok(Some(strip_title_prefix(&label, title).to_string()))
}

fn trimmed(attr: Option<String>) -> String {
    attr.unwrap_or_default().trim().to_string()
}

fn unusable(label: &str) -> bool {
    label.is_empty() || PLACEHOLDER_RE.is_match(label)
}

/// Card labels often repeat the carousel title ("Films - Alpha"); strip that
/// prefix when present. Labels with an unrelated prefix stay whole.
fn strip_title_prefix<'a>(label: &'a str, title: &str) -> &'a str {
    for sep in [" - ", " – "] {
        if let Some(rest) = label
            .strip_prefix(title)
            .and_then(|rest| rest.strip_prefix(sep))
        {
            return rest.trim();
        }
    }
    label
}

// ── Tests ──
