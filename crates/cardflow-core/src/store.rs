//! The board mutation core: the single source of truth for board data.
//!
//! Every operation validates, builds a new [`Board`] snapshot and records an
//! invertible [`Command`] where the edit is tracked. Unknown ids are silent
//! no-ops reported through a `false` return.

use crate::board::{Board, BoardItem, CardLocation, Column};
use crate::history::{Command, History};
use crate::id::{CardId, ColumnId};
use std::sync::Arc;

/// Owns the current board snapshot and its history.
#[derive(Debug, Clone)]
pub struct BoardStore<T> {
    board: Arc<Board<T>>,
    history: History<T>,
}

impl<T: BoardItem> BoardStore<T> {
    /// Create a store around an initial board.
    pub fn new(board: Board<T>, max_history: usize) -> Self {
        Self {
            board: Arc::new(board),
            history: History::new(max_history),
        }
    }

    /// The current board snapshot.
    pub fn board(&self) -> Arc<Board<T>> {
        self.board.clone()
    }

    /// Borrow the current board.
    pub fn current(&self) -> &Board<T> {
        &self.board
    }

    /// Replace the board wholesale. History is cleared.
    pub fn set_board(&mut self, board: Board<T>) {
        log::debug!("Board replaced ({} columns)", board.columns.len());
        self.board = Arc::new(board);
        self.history.clear();
    }

    fn commit(&mut self, board: Board<T>, command: Option<Command<T>>) {
        self.board = Arc::new(board);
        if let Some(command) = command {
            self.history.record(command);
        }
    }

    /// Locate a card.
    pub fn find_card(&self, card_id: &CardId) -> Option<CardLocation<T>> {
        self.board.find_card(card_id)
    }

    /// Move a card to `to_index` within `to_column_id`.
    ///
    /// The index is clamped after the card has been removed from its current
    /// position, so callers moving within a column need not adjust it.
    pub fn move_card(
        &mut self,
        card_id: &CardId,
        to_column_id: &ColumnId,
        to_index: usize,
    ) -> bool {
        let Some(from) = self.board.find_card(card_id) else {
            return false;
        };
        if &from.column_id == to_column_id && from.index == to_index {
            return false;
        }
        let Some((board, to_index)) =
            self.board
                .with_card_moved(card_id, &from.column_id, to_column_id, to_index)
        else {
            return false;
        };
        if &from.column_id == to_column_id && from.index == to_index {
            // Clamping landed the card back where it was.
            return false;
        }

        log::debug!(
            "Moved card {} from {}[{}] to {}[{}]",
            card_id,
            from.column_id,
            from.index,
            to_column_id,
            to_index
        );
        let command = Command::MoveCard {
            card_id: card_id.clone(),
            from_column: from.column_id,
            from_index: from.index,
            to_column: to_column_id.clone(),
            to_index,
        };
        self.commit(board, Some(command));
        true
    }

    /// Insert a card; `index` defaults to the end and is clamped.
    pub fn add_card(&mut self, column_id: &ColumnId, item: T, index: Option<usize>) -> bool {
        if self.board.find_card(item.id()).is_some() {
            log::warn!("Card {} is already on the board", item.id());
            return false;
        }
        let inserted = self
            .board
            .with_card_inserted(column_id, item.clone(), index);
        let Some((board, index)) = inserted else {
            return false;
        };
        let command = Command::AddCard {
            column_id: column_id.clone(),
            item,
            index,
        };
        self.commit(board, Some(command));
        true
    }

    /// Remove a card from a column.
    pub fn remove_card(&mut self, column_id: &ColumnId, card_id: &CardId) -> bool {
        let Some((board, item, index)) = self.board.with_card_removed(column_id, card_id) else {
            return false;
        };
        let command = Command::RemoveCard {
            column_id: column_id.clone(),
            item,
            index,
        };
        self.commit(board, Some(command));
        true
    }

    /// Insert a column; `index` defaults to the end and is clamped.
    pub fn add_column(&mut self, column: Column<T>, index: Option<usize>) -> bool {
        if self.board.column_index(&column.id).is_some() {
            log::warn!("Column {} is already on the board", column.id);
            return false;
        }
        let (board, index) = self.board.with_column_inserted(column.clone(), index);
        self.commit(board, Some(Command::AddColumn { column, index }));
        true
    }

    /// Remove a column and all of its cards.
    pub fn remove_column(&mut self, column_id: &ColumnId) -> bool {
        let Some((board, column, index)) = self.board.with_column_removed(column_id) else {
            return false;
        };
        self.commit(board, Some(Command::RemoveColumn { column, index }));
        true
    }

    /// Reorder columns. Not recorded in history.
    pub fn move_column(&mut self, from_index: usize, to_index: usize) -> bool {
        if from_index == to_index {
            return false;
        }
        let Some(board) = self.board.with_column_moved(from_index, to_index) else {
            return false;
        };
        self.commit(board, None);
        true
    }

    /// Replace a card's value. The updater must keep the card's id.
    /// Not recorded in history.
    pub fn update_card(&mut self, card_id: &CardId, updater: impl FnOnce(&T) -> T) -> bool {
        let Some(location) = self.board.find_card(card_id) else {
            return false;
        };
        let updated = updater(&location.item);
        if updated.id() != card_id {
            log::warn!("Rejected update of card {}: id changed to {}", card_id, updated.id());
            return false;
        }
        let Some(board) = self.board.with_column_updated(&location.column_id, |column| {
            column.items[location.index] = updated;
        }) else {
            return false;
        };
        self.commit(board, None);
        true
    }

    /// Edit a column's metadata. The column's id and items are preserved.
    /// Not recorded in history.
    pub fn update_column(
        &mut self,
        column_id: &ColumnId,
        updater: impl FnOnce(&mut Column<T>),
    ) -> bool {
        let Some(board) = self.board.with_column_updated(column_id, |column| {
            let id = column.id.clone();
            let items = column.items.clone();
            updater(column);
            column.id = id;
            column.items = items;
        }) else {
            return false;
        };
        self.commit(board, None);
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.board) {
            Some(board) => {
                self.board = Arc::new(board);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.board) {
            Some(board) => {
                self.board = Arc::new(board);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &History<T> {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::*;
    use crate::id::Id;

    fn store() -> BoardStore<TestCard> {
        BoardStore::new(sample_board(), 50)
    }

    #[test]
    fn test_cross_column_move() {
        let mut store = store();
        assert!(store.move_card(&Id::from("card-1"), &Id::from("col-2"), 0));
        assert_eq!(card_ids(store.current(), "col-1"), vec!["card-2", "card-3"]);
        assert_eq!(card_ids(store.current(), "col-2"), vec!["card-1", "card-4"]);
    }

    #[test]
    fn test_same_position_move_is_idempotent() {
        let mut store = store();
        let before = store.board();
        assert!(!store.move_card(&Id::from("card-2"), &Id::from("col-1"), 1));
        assert_eq!(*store.board(), *before);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_clamped_to_same_position_is_noop() {
        let mut store = store();
        // card-3 is last; index 10 clamps back to 2.
        assert!(!store.move_card(&Id::from("card-3"), &Id::from("col-1"), 10));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_unknown_ids_are_silent_noops() {
        let mut store = store();
        assert!(!store.move_card(&Id::from("ghost"), &Id::from("col-2"), 0));
        assert!(!store.move_card(&Id::from("card-1"), &Id::from("ghost"), 0));
        assert!(!store.remove_card(&Id::from("col-1"), &Id::from("ghost")));
        assert!(!store.remove_column(&Id::from("ghost")));
        assert!(!store.add_card(&Id::from("ghost"), TestCard::new("x"), None));
        assert_eq!(*store.board(), sample_board());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_previous_snapshot_is_unchanged() {
        let mut store = store();
        let snapshot = store.board();
        store.move_card(&Id::from("card-1"), &Id::from("col-2"), 0);
        assert_eq!(card_ids(&snapshot, "col-1"), vec!["card-1", "card-2", "card-3"]);
    }

    #[test]
    fn test_undo_redo_restores_exact_boards() {
        let mut store = store();
        let original = (*store.board()).clone();

        store.move_card(&Id::from("card-1"), &Id::from("col-2"), 1);
        store.add_card(&Id::from("col-1"), TestCard::new("card-5"), Some(0));
        store.remove_card(&Id::from("col-1"), &Id::from("card-3"));
        store.add_column(Column::with_id("col-3", "Done"), Some(1));
        store.move_card(&Id::from("card-4"), &Id::from("col-3"), 0);
        store.remove_column(&Id::from("col-2"));
        let edited = (*store.board()).clone();

        for _ in 0..6 {
            assert!(store.undo());
        }
        assert!(!store.undo());
        assert_eq!(*store.board(), original);

        for _ in 0..6 {
            assert!(store.redo());
        }
        assert!(!store.redo());
        assert_eq!(*store.board(), edited);
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut store = store();
        store.move_card(&Id::from("card-1"), &Id::from("col-2"), 0);
        store.undo();
        assert!(store.can_redo());
        store.add_card(&Id::from("col-2"), TestCard::new("card-5"), None);
        assert!(!store.can_redo());
    }

    #[test]
    fn test_history_bound() {
        let mut store = BoardStore::new(sample_board(), 3);
        for i in 0..5 {
            store.add_card(&Id::from("col-2"), TestCard::new(&format!("n-{i}")), None);
        }
        let mut undos = 0;
        while store.undo() {
            undos += 1;
        }
        assert_eq!(undos, 3);
        assert_eq!(store.current().card_count(), 6);
    }

    #[test]
    fn test_set_board_clears_history() {
        let mut store = store();
        store.move_card(&Id::from("card-1"), &Id::from("col-2"), 0);
        store.set_board(sample_board());
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn test_add_clamps_negative_free_index() {
        let mut store = store();
        assert!(store.add_column(Column::with_id("col-0", "First"), Some(0)));
        assert!(store.add_column(Column::with_id("col-9", "Last"), Some(usize::MAX)));
        let ids: Vec<_> = store.current().columns.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["col-0", "col-1", "col-2", "col-9"]);
    }

    #[test]
    fn test_move_column_not_recorded() {
        let mut store = store();
        assert!(store.move_column(0, 1));
        assert_eq!(store.current().columns[0].id, Id::from("col-2"));
        assert!(!store.can_undo());
        assert!(!store.move_column(5, 0));
    }

    #[test]
    fn test_update_card_keeps_id() {
        let mut store = store();
        assert!(store.update_card(&Id::from("card-2"), |card| TestCard {
            title: "Renamed".to_string(),
            ..card.clone()
        }));
        assert_eq!(store.find_card(&Id::from("card-2")).unwrap().item.title, "Renamed");
        assert!(!store.update_card(&Id::from("card-2"), |_| TestCard::new("other")));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_update_column_preserves_identity() {
        let mut store = store();
        assert!(store.update_column(&Id::from("col-1"), |column| {
            column.title = "Backlog".to_string();
            column.collapsed = true;
            column.items.clear();
        }));
        let column = store.current().column(&Id::from("col-1")).unwrap();
        assert_eq!(column.title, "Backlog");
        assert!(column.collapsed);
        assert_eq!(column.len(), 3);
    }
}
