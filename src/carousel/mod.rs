//! Discovery and classification of the carousel sections of a page, plus the
//! per-widget card enumerators.

pub mod blocks;
pub mod gate;
pub mod slick;
pub mod swiper;

use serde::Serialize;
use tracing::info;

pub use blocks::{CarouselBlock, WidgetKind};

use crate::config::RunConfig;
use crate::session::{Element, Session, SessionError};

/// How a card is re-found on a fresh page load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CardIdentity {
    /// data-swiper-slide-index value, assigned once at widget init.
    Swiper { slide_index: i64 },
    /// Visible card name, unique within its block after dedup.
    Slick { label: String },
}

/// One enumerated card, ready to be turned into a navigation task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyCard {
    pub order: usize,
    pub label: String,
    pub identity: CardIdentity,
}

/// Everything learned about one block on a single load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSurvey {
    pub block: CarouselBlock,
    pub cards: Vec<SurveyCard>,
    pub has_show_more: bool,
}

/// Classify every carousel block on the current page and enumerate its
/// cards. Unknown widgets are reported with zero cards and never visited.
pub async fn survey_page(
    session: &dyn Session,
    config: &RunConfig,
) -> Result<Vec<BlockSurvey>, SessionError> {
    let handles = session.query_all(blocks::BLOCK_SEL).await?;
    let mut surveys = Vec::with_capacity(handles.len());

    for (i, handle) in handles.iter().enumerate() {
        let index = i + 1;
        handle.scroll_into_view().await?;
        let block = blocks::classify(handle.as_ref(), index).await?;

        let cards = match block.kind {
            WidgetKind::Swiper => swiper::enumerate(handle.as_ref(), &block.title)
                .await?
                .into_iter()
                .map(|c| SurveyCard {
                    order: c.order,
                    label: c.label,
                    identity: CardIdentity::Swiper {
                        slide_index: c.slide_index,
                    },
                })
                .collect(),
            WidgetKind::Slick => {
                slick::enumerate(handle.as_ref(), config.slick_scan_cap, config.slick_scan_delay)
                    .await?
                    .into_iter()
                    .map(|c| SurveyCard {
                        order: c.order,
                        identity: CardIdentity::Slick {
                            label: c.label.clone(),
                        },
                        label: c.label,
                    })
                    .collect()
            }
            WidgetKind::Unknown => Vec::new(),
        };

        let has_show_more = blocks::find_show_more(handle.as_ref()).await?.is_some();
        info!(
            "Block {}: {} [{}], {} cards{}",
            index,
            block.title,
            block.kind.label(),
            cards.len(),
            if has_show_more { ", show-more link" } else { "" }
        );
        surveys.push(BlockSurvey {
            block,
            cards,
            has_show_more,
        });
    }

    Ok(surveys)
}

// ── Tests ──
