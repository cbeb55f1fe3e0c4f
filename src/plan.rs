use serde::Serialize;

use crate::carousel::{BlockSurvey, CardIdentity, WidgetKind};
use crate::rows::SHOW_MORE_LABEL;

/// What a task does once its block is re-located.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TaskAction {
    /// Follow the block's "voir plus" link.
    ShowMore,
    /// Activate one card and record where it leads.
    OpenCard {
        order: usize,
        label: String,
        identity: CardIdentity,
    },
}

/// One planned navigation: reload the page, re-find the block, perform the
/// action, record the resulting URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationTask {
    pub carousel_index: usize,
    pub kind: WidgetKind,
    pub block_title: String,
    pub action: TaskAction,
}

impl NavigationTask {
    /// Value of the "titre (card)" column for this task's row.
    pub fn card_label(&self) -> &str {
        match &self.action {
            TaskAction::ShowMore => SHOW_MORE_LABEL,
            TaskAction::OpenCard { label, .. } => label,
        }
    }

    pub fn order(&self) -> Option<usize> {
        match &self.action {
            TaskAction::ShowMore => None,
            TaskAction::OpenCard { order, .. } => Some(*order),
        }
    }

    /// One-line description for logs and the progress bar.
    pub fn describe(&self) -> String {
        match &self.action {
            TaskAction::ShowMore => format!("bloc {} voir plus", self.carousel_index),
            TaskAction::OpenCard { order, label, .. } => {
                format!("bloc {} carte {} {:?}", self.carousel_index, order, label)
            }
        }
    }
}

/// Expand surveys into a flat task list. Page order is preserved; within a
/// block the show-more link comes before the cards.
pub fn build_tasks(surveys: &[BlockSurvey]) -> Vec<NavigationTask> {
    let mut tasks = Vec::new();
    for survey in surveys {
        if survey.has_show_more {
            tasks.push(NavigationTask {
                carousel_index: survey.block.index,
                kind: survey.block.kind,
                block_title: survey.block.title.clone(),
                action: TaskAction::ShowMore,
            });
        }
        for card in &survey.cards {
            tasks.push(NavigationTask {
                carousel_index: survey.block.index,
                kind: survey.block.kind,
                block_title: survey.block.title.clone(),
                action: TaskAction::OpenCard {
                    order: card.order,
                    label: card.label.clone(),
                    identity: card.identity.clone(),
                },
            });
        }
    }
    tasks
}

// ── Tests ──
