use crate::carousel::blocks::WidgetKind;

/// Exported column header, in the exact order the downstream consumers of the
/// CSV expect.
pub const COLUMNS: [&str; 7] = [
    "# Carrousel",
    "Type",
    "Titre du carrousel",
    "#",
    "titre (card)",
    "URL détail",
    "Chemin",
];

/// Card label used for show-more rows.
pub const SHOW_MORE_LABEL: &str = "Voir plus";

/// One resolved navigation outcome. Rows accumulate in task order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub carousel_index: usize,
    pub kind: WidgetKind,
    pub block_title: String,
    /// 1-based position among the block's card tasks; show-more rows carry none.
    pub order: Option<usize>,
    pub card_label: String,
    pub resolved_url: String,
    pub path: String,
}

impl ResultRow {
    /// CSV record in `COLUMNS` order; an absent order renders empty.
    pub fn to_record(&self) -> [String; 7] {
        [
            self.carousel_index.to_string(),
            self.kind.label().to_string(),
            self.block_title.clone(),
            self.order.map(|o| o.to_string()).unwrap_or_default(),
            self.card_label.clone(),
            self.resolved_url.clone(),
            self.path.clone(),
        ]
    }
}

/// Everything after the first host marker of a resolved URL, or empty when
/// the URL points somewhere else entirely.
pub fn derive_path(url: &str, host_marker: &str) -> String {
    url.split_once(host_marker)
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default()
}

// ── Tests ──
