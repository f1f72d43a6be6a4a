//! The content-provider seam.
//!
//! Decks come from an external catalog. The core only needs one thing
//! from it: a stable [`DeckRef`] per room, requested exactly once when the
//! room is created. The provider is injected into the registry rather
//! than reached through a process-wide singleton, so tests can hand in a
//! fake.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use streammate_protocol::{ContentCategory, DeckRef, ItemId};

/// The provider could not produce a deck.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content unavailable: {0}")]
pub struct ContentError(pub String);

/// Supplies decks for new rooms.
///
/// Called while no room lock is held, before the room exists. It must not
/// block for long: deck assignment sits on the room-creation path.
pub trait ContentProvider: Send + Sync + 'static {
    /// Produces the deck every member of one new room will swipe through.
    fn assign_deck(
        &self,
        category: &ContentCategory,
    ) -> Result<DeckRef, ContentError>;

    /// The room holding `deck` is gone, or was never registered. Called
    /// at most once per assigned deck, with no room lock held.
    fn release_deck(&self, _deck: &DeckRef) {}
}

/// In-memory provider: a fixed catalog per category.
///
/// Each assigned deck is a snapshot of the catalog at assignment time, so
/// later catalog edits never reorder a live room's deck.
#[derive(Default)]
pub struct StaticContentProvider {
    catalogs: HashMap<ContentCategory, Vec<ItemId>>,
    decks: Mutex<HashMap<DeckRef, Arc<[ItemId]>>>,
    next_deck: AtomicU64,
}

impl StaticContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the catalog for a category.
    pub fn with_category(
        mut self,
        category: ContentCategory,
        items: impl IntoIterator<Item = ItemId>,
    ) -> Self {
        self.catalogs.insert(category, items.into_iter().collect());
        self
    }

    /// Resolves a previously assigned deck to its ordered item ids.
    pub fn deck_items(&self, deck: &DeckRef) -> Option<Arc<[ItemId]>> {
        self.decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(deck)
            .cloned()
    }

    /// Number of decks assigned and not yet released.
    pub fn deck_count(&self) -> usize {
        self.decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ContentProvider for StaticContentProvider {
    fn assign_deck(
        &self,
        category: &ContentCategory,
    ) -> Result<DeckRef, ContentError> {
        let items = self
            .catalogs
            .get(category)
            .filter(|items| !items.is_empty())
            .ok_or_else(|| {
                ContentError(format!("no content for category {category}"))
            })?;

        let n = self.next_deck.fetch_add(1, Ordering::Relaxed) + 1;
        let deck = DeckRef::new(format!("{category}-{n}"));
        self.decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(deck.clone(), Arc::from(items.as_slice()));
        tracing::debug!(%category, %deck, items = items.len(), "deck assigned");
        Ok(deck)
    }

    fn release_deck(&self, deck: &DeckRef) {
        let removed = self
            .decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(deck);
        if removed.is_some() {
            tracing::debug!(%deck, "deck released");
        }
    }
}
