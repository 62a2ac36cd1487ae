//! Board, column and item data.
//!
//! Board values are immutable snapshots. Every edit produces a new
//! [`Board`]; columns that were not touched are shared with the previous
//! snapshot through [`Arc`], touched columns are rebuilt. A consumer holding
//! an older board never observes a change.

use crate::color::SerializableColor;
use crate::id::{BoardId, CardId, ColumnId, Id};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// A user-supplied card payload.
///
/// The engine only needs the identifier; everything else is opaque.
pub trait BoardItem: Clone + Debug {
    /// Unique id of this item across the whole board.
    fn id(&self) -> &CardId;
}

/// An ordered list of items with display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column<T> {
    pub id: ColumnId,
    pub title: String,
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
    /// Work-in-progress limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub collapsed: bool,
}

impl<T: BoardItem> Column<T> {
    /// Create an empty column with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Id::new(), title)
    }

    /// Create an empty column with a known id.
    pub fn with_id(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
            color: None,
            max_items: None,
            collapsed: false,
        }
    }

    pub fn with_items(mut self, items: Vec<T>) -> Self {
        self.items = items;
        self
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the column has reached its WIP limit.
    pub fn is_full(&self) -> bool {
        self.max_items.is_some_and(|max| self.items.len() >= max)
    }

    /// Index of a card within this column.
    pub fn position_of(&self, card_id: &CardId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == card_id)
    }
}

/// Where a card currently lives.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLocation<T> {
    pub column_id: ColumnId,
    pub column_index: usize,
    pub index: usize,
    pub item: T,
}

/// A board: an id plus an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board<T> {
    pub id: BoardId,
    pub columns: Vec<Arc<Column<T>>>,
}

impl<T: BoardItem> Default for Board<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: BoardItem> Board<T> {
    /// Create a board with a fresh id.
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self::with_id(Id::new(), columns)
    }

    /// Create a board with a known id.
    pub fn with_id(id: impl Into<BoardId>, columns: Vec<Column<T>>) -> Self {
        Self {
            id: id.into(),
            columns: columns.into_iter().map(Arc::new).collect(),
        }
    }

    /// Get a column by id.
    pub fn column(&self, column_id: &ColumnId) -> Option<&Column<T>> {
        self.columns
            .iter()
            .find(|column| &column.id == column_id)
            .map(Arc::as_ref)
    }

    /// Position of a column in the board.
    pub fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| &column.id == column_id)
    }

    /// Locate a card by linear scan.
    pub fn find_card(&self, card_id: &CardId) -> Option<CardLocation<T>> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(column_index, column)| {
                column.position_of(card_id).map(|index| CardLocation {
                    column_id: column.id.clone(),
                    column_index,
                    index,
                    item: column.items[index].clone(),
                })
            })
    }

    /// Total number of cards on the board.
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|column| column.len()).sum()
    }

    /// Build a new board with one column rebuilt by `edit`.
    fn rebuild_column(&self, column_index: usize, edit: impl FnOnce(&mut Column<T>)) -> Self {
        let mut columns = self.columns.clone();
        let mut column = Column::clone(&columns[column_index]);
        edit(&mut column);
        columns[column_index] = Arc::new(column);
        Self {
            id: self.id.clone(),
            columns,
        }
    }

    /// Insert an item, clamping `index` into `[0, len]`.
    ///
    /// Returns the new board and the index actually used, or `None` if the
    /// column does not exist.
    pub(crate) fn with_card_inserted(
        &self,
        column_id: &ColumnId,
        item: T,
        index: Option<usize>,
    ) -> Option<(Self, usize)> {
        let column_index = self.column_index(column_id)?;
        let len = self.columns[column_index].len();
        let index = index.unwrap_or(len).min(len);
        let board = self.rebuild_column(column_index, |column| column.items.insert(index, item));
        Some((board, index))
    }

    /// Remove a card from a specific column.
    pub(crate) fn with_card_removed(
        &self,
        column_id: &ColumnId,
        card_id: &CardId,
    ) -> Option<(Self, T, usize)> {
        let column_index = self.column_index(column_id)?;
        let index = self.columns[column_index].position_of(card_id)?;
        let item = self.columns[column_index].items[index].clone();
        let board = self.rebuild_column(column_index, |column| {
            column.items.remove(index);
        });
        Some((board, item, index))
    }

    /// Move a card between (or within) columns by removal then insertion.
    ///
    /// Returns the new board and the clamped destination index.
    pub(crate) fn with_card_moved(
        &self,
        card_id: &CardId,
        from_column: &ColumnId,
        to_column: &ColumnId,
        to_index: usize,
    ) -> Option<(Self, usize)> {
        self.column_index(to_column)?;
        let (removed, item, _) = self.with_card_removed(from_column, card_id)?;
        removed.with_card_inserted(to_column, item, Some(to_index))
    }

    /// Insert a column, clamping `index` into `[0, len]`.
    pub(crate) fn with_column_inserted(
        &self,
        column: Column<T>,
        index: Option<usize>,
    ) -> (Self, usize) {
        let len = self.columns.len();
        let index = index.unwrap_or(len).min(len);
        let mut columns = self.columns.clone();
        columns.insert(index, Arc::new(column));
        (
            Self {
                id: self.id.clone(),
                columns,
            },
            index,
        )
    }

    /// Remove a column by id.
    pub(crate) fn with_column_removed(
        &self,
        column_id: &ColumnId,
    ) -> Option<(Self, Column<T>, usize)> {
        let index = self.column_index(column_id)?;
        let mut columns = self.columns.clone();
        let removed = columns.remove(index);
        Some((
            Self {
                id: self.id.clone(),
                columns,
            },
            Column::clone(&removed),
            index,
        ))
    }

    /// Replace one column through an updater.
    pub(crate) fn with_column_updated(
        &self,
        column_id: &ColumnId,
        updater: impl FnOnce(&mut Column<T>),
    ) -> Option<Self> {
        let column_index = self.column_index(column_id)?;
        Some(self.rebuild_column(column_index, updater))
    }

    /// Reorder the column list.
    pub(crate) fn with_column_moved(&self, from_index: usize, to_index: usize) -> Option<Self> {
        if from_index >= self.columns.len() {
            return None;
        }
        let mut columns = self.columns.clone();
        let column = columns.remove(from_index);
        let to_index = to_index.min(columns.len());
        columns.insert(to_index, column);
        Some(Self {
            id: self.id.clone(),
            columns,
        })
    }
}

impl<T> Board<T>
where
    T: BoardItem + Serialize + for<'de> Deserialize<'de>,
{
    /// Serialize the board to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a board from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal card used across the crate's tests.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TestCard {
        pub id: CardId,
        pub title: String,
    }

    impl TestCard {
        pub fn new(id: &str) -> Self {
            Self {
                id: Id::from(id),
                title: id.to_uppercase(),
            }
        }
    }

    impl BoardItem for TestCard {
        fn id(&self) -> &CardId {
            &self.id
        }
    }

    /// `col-1` = [card-1, card-2, card-3], `col-2` = [card-4].
    pub fn sample_board() -> Board<TestCard> {
        Board::with_id(
            "board-1",
            vec![
                Column::with_id("col-1", "To do").with_items(vec![
                    TestCard::new("card-1"),
                    TestCard::new("card-2"),
                    TestCard::new("card-3"),
                ]),
                Column::with_id("col-2", "Doing").with_items(vec![TestCard::new("card-4")]),
            ],
        )
    }

    pub fn card_ids(board: &Board<TestCard>, column: &str) -> Vec<String> {
        board
            .column(&Id::from(column))
            .map(|c| c.items.iter().map(|i| i.id.to_string()).collect())
            .unwrap_or_default()
    }
}
