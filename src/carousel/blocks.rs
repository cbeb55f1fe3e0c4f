use serde::Serialize;

use super::{slick, swiper};
use crate::error::TaskError;
use crate::session::{Element, Session, SessionError};

pub(crate) const BLOCK_SEL: &str = "app-page-block";
pub(crate) const TITLE_SEL: &str = ".block-title";

/// Carousel rendering strategy, detected per block by structural probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WidgetKind {
    Swiper,
    Slick,
    Unknown,
}

impl WidgetKind {
    /// Display string, also the CSV "Type" column value.
    pub fn label(self) -> &'static str {
        match self {
            WidgetKind::Swiper => "Grande carrousel (swiper)",
            WidgetKind::Slick => "Petite carrousel (slick)",
            WidgetKind::Unknown => "Carrousel inconnu",
        }
    }
}

/// One carousel section as seen on a single page load. The index is 1-based
/// page order and only meaningful within that load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselBlock {
    pub index: usize,
    pub kind: WidgetKind,
    pub title: String,
}

/// Number of carousel blocks currently in the render tree.
pub async fn count(session: &dyn Session) -> Result<usize, SessionError> {
    Ok(session.query_all(BLOCK_SEL).await?.len())
}

/// Re-find a block by its recorded 1-based index on a fresh load.
pub async fn locate(session: &dyn Session, index: usize) -> Result<Box<dyn Element>, TaskError> {
    let mut blocks = session.query_all(BLOCK_SEL).await.map_err(TaskError::Session)?;
    if index == 0 || index > blocks.len() {
        return Err(TaskError::BlockNotFound { index });
    }
    Ok(blocks.swap_remove(index - 1))
}

/// Classify one block: swiper slides win over slick slides; a block with
/// neither is Unknown and never enumerated.
pub async fn classify(element: &dyn Element, index: usize) -> Result<CarouselBlock, SessionError> {
    let kind = if element.query(swiper::SLIDE_SEL).await?.is_some() {
        WidgetKind::Swiper
    } else if element.query(slick::SLIDE_SEL).await?.is_some() {
        WidgetKind::Slick
    } else {
        WidgetKind::Unknown
    };

    let title = match element.query(TITLE_SEL).await? {
        Some(el) => {
            let text = el.text().await?;
            let text = text.trim();
            if text.is_empty() {
                format!("Carrousel_{index}")
            } else {
                text.to_string()
            }
        }
        None => format!("Carrousel_{index}"),
    };

    Ok(CarouselBlock { index, kind, title })
}

/// Find a displayed "voir plus" link inside a block, if any. Anchors are
/// matched on their text, role=link elements on their aria-label.
pub async fn find_show_more(element: &dyn Element) -> Result<Option<Box<dyn Element>>, SessionError> {
    for link in element.query_all("a").await? {
        let text = link.text().await?.to_lowercase();
        if is_show_more(&text) && link.is_displayed().await? {
            return Ok(Some(link));
        }
    }
    for link in element.query_all("[role='link']").await? {
        let aria = link.attr("aria-label").await?.unwrap_or_default().to_lowercase();
        if is_show_more(&aria) && link.is_displayed().await? {
            return Ok(Some(link));
        }
    }
    Ok(None)
}

fn is_show_more(text: &str) -> bool {
    text.contains("voir plus") || text.contains("show more")
}

// ── Tests ──
