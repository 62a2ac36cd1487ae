//! Screen-space drop-zone registry.
//!
//! The rendering layer reports card and column rectangles as layout settles;
//! the registry resolves pointer positions to drop targets. Entries are
//! per-frame input only and are never authoritative board state.

use crate::id::{CardId, ColumnId};
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// A registered card rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct CardZone {
    pub column_id: ColumnId,
    pub index: usize,
    pub bounds: Rect,
}

/// A registered column rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnZone {
    pub index: usize,
    pub bounds: Rect,
}

/// A resolved drop target: the column and insertion index a dragged card
/// would occupy if released now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub column_id: ColumnId,
    pub index: usize,
}

/// Registry of card and column rectangles, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct DropZoneRegistry {
    cards: HashMap<CardId, CardZone>,
    columns: HashMap<ColumnId, ColumnZone>,
}

impl DropZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a card's rectangle.
    pub fn register_card(
        &mut self,
        card_id: CardId,
        column_id: ColumnId,
        index: usize,
        bounds: Rect,
    ) {
        self.cards.insert(
            card_id,
            CardZone {
                column_id,
                index,
                bounds,
            },
        );
    }

    /// Forget a card.
    ///
    /// Only removes the entry if it is still registered under `column_id`, so a
    /// late unregister from the card's old column does not wipe the
    /// registration made by its new one.
    pub fn unregister_card(&mut self, card_id: &CardId, column_id: &ColumnId) {
        if self
            .cards
            .get(card_id)
            .is_some_and(|zone| &zone.column_id == column_id)
        {
            self.cards.remove(card_id);
        }
    }

    /// Register or overwrite a column's rectangle.
    pub fn register_column(&mut self, column_id: ColumnId, index: usize, bounds: Rect) {
        self.columns.insert(column_id, ColumnZone { index, bounds });
    }

    pub fn unregister_column(&mut self, column_id: &ColumnId) {
        self.columns.remove(column_id);
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.columns.clear();
    }

    pub fn card_bounds(&self, card_id: &CardId) -> Option<Rect> {
        self.cards.get(card_id).map(|zone| zone.bounds)
    }

    pub fn column_bounds(&self, column_id: &ColumnId) -> Option<Rect> {
        self.columns.get(column_id).map(|zone| zone.bounds)
    }

    /// Column whose rectangle contains `position`.
    pub fn find_column_at(&self, position: Point) -> Option<ColumnId> {
        self.columns
            .iter()
            .filter(|(_, zone)| zone.bounds.contains(position))
            .min_by_key(|(_, zone)| zone.index)
            .map(|(id, _)| id.clone())
    }

    /// Resolve a pointer position to a drop target.
    ///
    /// The dragged card is excluded; the remaining cards of the column under
    /// the pointer are ordered by their top edge and the target index is the
    /// first card whose vertical center lies below the pointer, or the end of
    /// the list.
    pub fn find_drop_target(
        &self,
        position: Point,
        dragged_card_id: &CardId,
        dragged_from_column_id: &ColumnId,
    ) -> Option<DropTarget> {
        let column_id = self.find_column_at(position)?;

        let mut cards: Vec<&Rect> = self
            .cards
            .iter()
            .filter(|(card_id, zone)| zone.column_id == column_id && *card_id != dragged_card_id)
            .map(|(_, zone)| &zone.bounds)
            .collect();

        if cards.is_empty() {
            log::trace!(
                "drop target: empty column {} (dragged from {})",
                column_id,
                dragged_from_column_id
            );
            return Some(DropTarget { column_id, index: 0 });
        }

        cards.sort_by(|a, b| a.y0.total_cmp(&b.y0));
        let index = cards
            .iter()
            .position(|bounds| bounds.center().y > position.y)
            .unwrap_or(cards.len());

        Some(DropTarget { column_id, index })
    }
}
