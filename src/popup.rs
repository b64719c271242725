use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::WalkthroughError;

/// Title used when the popup text does not provide one.
pub const DEFAULT_TITLE: &str = "Popup";
/// Text shown when a popup has no pages.
pub const NO_CONTENT: &str = "No content available.";

/// Keys of the popup text document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PopupKey {
    #[serde(rename = "oven")]
    Oven,
    #[serde(rename = "water")]
    WaterHeater,
    #[serde(rename = "airSourceHP")]
    HeatPump,
    #[serde(rename = "grid")]
    Grid,
    #[serde(rename = "sPanels")]
    Solar,
    #[serde(rename = "ev")]
    Ev,
}

impl PopupKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PopupKey::Oven => "oven",
            PopupKey::WaterHeater => "water",
            PopupKey::HeatPump => "airSourceHP",
            PopupKey::Grid => "grid",
            PopupKey::Solar => "sPanels",
            PopupKey::Ev => "ev",
        }
    }
}

impl fmt::Display for PopupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the popup text document, in any accepted shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Pages(Vec<String>),
    Titled {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        sequence: Vec<String>,
    },
}

/// Title plus ordered pages of a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupEntry {
    pub title: String,
    pub pages: Vec<String>,
}

impl From<RawEntry> for PopupEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Text(text) => Self {
                title: DEFAULT_TITLE.to_string(),
                pages: vec![text],
            },
            RawEntry::Pages(pages) => Self {
                title: DEFAULT_TITLE.to_string(),
                pages,
            },
            RawEntry::Titled { title, sequence } => Self {
                title: title
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                pages: sequence,
            },
        }
    }
}

/// Popup text fetched at startup. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PopupCatalog {
    entries: BTreeMap<String, PopupEntry>,
}

impl PopupCatalog {
    /// Parses the popup text document.
    ///
    /// The document must be a JSON object. Entries of an unknown shape are
    /// logged and skipped so the rest of the catalog stays usable.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(json).context("invalid popup text document")?;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match serde_json::from_value::<RawEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, PopupEntry::from(entry));
                }
                Err(err) => warn!("skipping popup entry `{key}`: {err}"),
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: PopupKey) -> Option<&PopupEntry> {
        self.entries.get(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which navigation buttons are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavButtons {
    pub prev: bool,
    pub next: bool,
}

/// Previous is enabled past the first page; next before the last.
pub fn nav_buttons(index: usize, len: usize) -> NavButtons {
    NavButtons {
        prev: len > 0 && index > 0,
        next: index + 1 < len,
    }
}

/// Pages of the popup currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSession {
    pub title: String,
    pub pages: Vec<String>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Closed,
    Open(PopupSession),
}

/// What the popup panel should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupView {
    Hidden,
    NoContent {
        title: String,
    },
    Page {
        title: String,
        text: String,
        page: usize,
        total: usize,
        nav: NavButtons,
    },
}

impl PopupView {
    pub fn nav(&self) -> NavButtons {
        match self {
            PopupView::Page { nav, .. } => *nav,
            _ => NavButtons::default(),
        }
    }
}

/// Steps through the pages of one popup at a time.
///
/// Sessions copy their pages out of the catalog, so closing a popup always
/// leaves the catalog exactly as it was loaded.
#[derive(Debug, Clone, Default)]
pub struct PopupSequencer {
    catalog: Arc<PopupCatalog>,
    state: PopupState,
    placeholder: Option<String>,
}

impl PopupSequencer {
    pub fn new(catalog: Arc<PopupCatalog>) -> Self {
        Self {
            catalog,
            state: PopupState::Closed,
            placeholder: None,
        }
    }

    pub fn set_catalog(&mut self, catalog: Arc<PopupCatalog>) {
        self.catalog = catalog;
    }

    pub fn catalog(&self) -> &PopupCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PopupState::Open(_))
    }

    pub fn index(&self) -> usize {
        match &self.state {
            PopupState::Open(session) => session.index,
            PopupState::Closed => 0,
        }
    }

    /// Opens `pages` at the first page, replacing any open popup.
    ///
    /// An empty sequence leaves the sequencer closed and shows the
    /// "no content" placeholder instead.
    pub fn open(
        &mut self,
        title: impl Into<String>,
        pages: Vec<String>,
    ) -> Result<(), WalkthroughError> {
        let title = title.into();
        if pages.is_empty() {
            warn!("popup `{title}` has no pages");
            self.state = PopupState::Closed;
            self.placeholder = Some(title.clone());
            return Err(WalkthroughError::EmptyPopup { title });
        }
        debug!("opening popup `{title}` ({} page(s))", pages.len());
        self.placeholder = None;
        self.state = PopupState::Open(PopupSession {
            title,
            pages,
            index: 0,
        });
        Ok(())
    }

    /// Opens the catalog entry for `key`; a missing entry counts as empty.
    pub fn open_key(&mut self, key: PopupKey) -> Result<(), WalkthroughError> {
        let (title, pages) = match self.catalog.get(key) {
            Some(entry) => (entry.title.clone(), entry.pages.clone()),
            None => (DEFAULT_TITLE.to_string(), Vec::new()),
        };
        self.open(title, pages)
    }

    pub fn next(&mut self) -> bool {
        match &mut self.state {
            PopupState::Open(session) if session.index + 1 < session.pages.len() => {
                session.index += 1;
                true
            }
            _ => false,
        }
    }

    pub fn prev(&mut self) -> bool {
        match &mut self.state {
            PopupState::Open(session) if session.index > 0 => {
                session.index -= 1;
                true
            }
            _ => false,
        }
    }

    /// Closes the popup (or dismisses the placeholder). Returns whether
    /// anything was on screen.
    pub fn close(&mut self) -> bool {
        let was_shown = self.is_open() || self.placeholder.is_some();
        self.state = PopupState::Closed;
        self.placeholder = None;
        was_shown
    }

    pub fn view(&self) -> PopupView {
        match (&self.state, &self.placeholder) {
            (PopupState::Open(session), _) => PopupView::Page {
                title: session.title.clone(),
                text: session.pages[session.index].clone(),
                page: session.index,
                total: session.pages.len(),
                nav: nav_buttons(session.index, session.pages.len()),
            },
            (PopupState::Closed, Some(title)) => PopupView::NoContent {
                title: title.clone(),
            },
            (PopupState::Closed, None) => PopupView::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = r#"{
        "oven": {
            "title": "Induction Cooking",
            "sequence": ["Page one", "Page two", "Page three"]
        },
        "water": ["Heat pump water heater"],
        "grid": { "sequence": [] },
        "extra": ["ignored by the walkthrough"]
    }"#;

    fn sequencer() -> PopupSequencer {
        PopupSequencer::new(Arc::new(PopupCatalog::from_json_str(TEXT).unwrap()))
    }

    fn pages(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn catalog_accepts_both_entry_shapes() {
        let catalog = PopupCatalog::from_json_str(TEXT).unwrap();
        assert_eq!(catalog.len(), 4);
        let oven = catalog.get(PopupKey::Oven).unwrap();
        assert_eq!(oven.title, "Induction Cooking");
        assert_eq!(oven.pages.len(), 3);
        let water = catalog.get(PopupKey::WaterHeater).unwrap();
        assert_eq!(water.title, DEFAULT_TITLE);
        assert_eq!(water.pages, pages(&["Heat pump water heater"]));
        assert!(catalog.get(PopupKey::Ev).is_none());
    }

    #[test]
    fn catalog_keeps_good_entries_next_to_bad_ones() {
        let json = r#"{
            "oven": ["Induction"],
            "intro": "Welcome to the house",
            "ev": 42,
            "grid": { "title": "Grid", "sequence": "not a list" }
        }"#;
        let catalog = PopupCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(PopupKey::Oven).unwrap().pages, pages(&["Induction"]));
        assert!(catalog.get(PopupKey::Ev).is_none());
        assert!(catalog.get(PopupKey::Grid).is_none());
    }

    #[test]
    fn bare_string_entry_is_a_single_page() {
        let catalog = PopupCatalog::from_json_str(r#"{ "sPanels": "Solar covers the roof" }"#)
            .unwrap();
        let solar = catalog.get(PopupKey::Solar).unwrap();
        assert_eq!(solar.title, DEFAULT_TITLE);
        assert_eq!(solar.pages, pages(&["Solar covers the roof"]));
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(PopupCatalog::from_json_str(r#"["oven"]"#).is_err());
        assert!(PopupCatalog::from_json_str("not json").is_err());
    }

    #[test]
    fn open_starts_at_first_page() {
        let mut popup = sequencer();
        popup.open_key(PopupKey::Oven).unwrap();
        assert!(popup.is_open());
        assert_eq!(popup.index(), 0);
        match popup.view() {
            PopupView::Page { title, text, total, nav, .. } => {
                assert_eq!(title, "Induction Cooking");
                assert_eq!(text, "Page one");
                assert_eq!(total, 3);
                assert_eq!(nav, NavButtons { prev: false, next: true });
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut popup = sequencer();
        popup.open_key(PopupKey::Oven).unwrap();
        assert!(!popup.prev());
        assert_eq!(popup.index(), 0);
        assert!(popup.next());
        assert!(popup.next());
        assert_eq!(popup.index(), 2);
        assert!(!popup.next());
        assert_eq!(popup.index(), 2);
        assert_eq!(popup.view().nav(), NavButtons { prev: true, next: false });
        assert!(popup.prev());
        assert_eq!(popup.index(), 1);
        assert_eq!(popup.view().nav(), NavButtons { prev: true, next: true });
    }

    #[test]
    fn empty_sequence_shows_placeholder() {
        let mut popup = sequencer();
        let err = popup.open("Grid", Vec::new()).unwrap_err();
        assert_eq!(err, WalkthroughError::EmptyPopup { title: "Grid".to_string() });
        assert!(!popup.is_open());
        assert_eq!(popup.view(), PopupView::NoContent { title: "Grid".to_string() });
        assert_eq!(popup.view().nav(), NavButtons::default());
        assert!(!popup.next());
        assert!(!popup.prev());
        assert!(popup.close());
        assert_eq!(popup.view(), PopupView::Hidden);
    }

    #[test]
    fn missing_or_empty_entries_count_as_no_content() {
        let mut popup = sequencer();
        assert!(popup.open_key(PopupKey::Grid).is_err());
        assert!(popup.open_key(PopupKey::Ev).is_err());
        assert!(!popup.is_open());
    }

    #[test]
    fn close_then_reopen_restores_catalog_content() {
        let mut popup = sequencer();
        let original = popup.catalog().clone();
        popup.open_key(PopupKey::Oven).unwrap();
        popup.next();
        popup.open_key(PopupKey::WaterHeater).unwrap();
        assert!(popup.close());
        assert_eq!(popup.index(), 0);
        assert_eq!(popup.catalog(), &original);

        popup.open_key(PopupKey::Oven).unwrap();
        match popup.view() {
            PopupView::Page { text, page, .. } => {
                assert_eq!(text, "Page one");
                assert_eq!(page, 0);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn nav_buttons_follow_index_and_length() {
        assert_eq!(nav_buttons(0, 0), NavButtons { prev: false, next: false });
        assert_eq!(nav_buttons(0, 1), NavButtons { prev: false, next: false });
        assert_eq!(nav_buttons(0, 2), NavButtons { prev: false, next: true });
        assert_eq!(nav_buttons(1, 2), NavButtons { prev: true, next: false });
    }

    #[test]
    fn closing_when_nothing_is_shown_reports_false() {
        let mut popup = PopupSequencer::default();
        assert!(!popup.close());
        popup.open("Solo", pages(&["only page"])).unwrap();
        assert_eq!(popup.view().nav(), NavButtons::default());
        assert!(popup.close());
    }
}
