//! Reversible command history for undo/redo.
//!
//! Each [`Command`] carries enough data to build its own inverse, so undo
//! and redo never consult the board to work out what to do. Inverses are
//! exact as long as commands are undone and redone in LIFO order.

use crate::board::{Board, BoardItem, Column};
use crate::id::{CardId, ColumnId};
use std::collections::VecDeque;

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// An invertible structural board edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<T> {
    MoveCard {
        card_id: CardId,
        from_column: ColumnId,
        from_index: usize,
        to_column: ColumnId,
        to_index: usize,
    },
    AddCard {
        column_id: ColumnId,
        item: T,
        index: usize,
    },
    RemoveCard {
        column_id: ColumnId,
        item: T,
        index: usize,
    },
    AddColumn {
        column: Column<T>,
        index: usize,
    },
    RemoveColumn {
        column: Column<T>,
        index: usize,
    },
}

impl<T: BoardItem> Command<T> {
    /// Short name for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Command::MoveCard { .. } => "move card",
            Command::AddCard { .. } => "add card",
            Command::RemoveCard { .. } => "remove card",
            Command::AddColumn { .. } => "add column",
            Command::RemoveColumn { .. } => "remove column",
        }
    }

    /// The command that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            Command::MoveCard {
                card_id,
                from_column,
                from_index,
                to_column,
                to_index,
            } => Command::MoveCard {
                card_id: card_id.clone(),
                from_column: to_column.clone(),
                from_index: *to_index,
                to_column: from_column.clone(),
                to_index: *from_index,
            },
            Command::AddCard { column_id, item, index } => Command::RemoveCard {
                column_id: column_id.clone(),
                item: item.clone(),
                index: *index,
            },
            Command::RemoveCard { column_id, item, index } => Command::AddCard {
                column_id: column_id.clone(),
                item: item.clone(),
                index: *index,
            },
            Command::AddColumn { column, index } => Command::RemoveColumn {
                column: column.clone(),
                index: *index,
            },
            Command::RemoveColumn { column, index } => Command::AddColumn {
                column: column.clone(),
                index: *index,
            },
        }
    }

    /// Apply the command to `board`, producing a new board.
    ///
    /// A command whose ids no longer resolve leaves the board unchanged.
    pub fn apply(&self, board: &Board<T>) -> Board<T> {
        let next = match self {
            Command::MoveCard {
                card_id,
                from_column,
                to_column,
                to_index,
                ..
            } => board
                .with_card_moved(card_id, from_column, to_column, *to_index)
                .map(|(board, _)| board),
            Command::AddCard { column_id, item, index } => board
                .with_card_inserted(column_id, item.clone(), Some(*index))
                .map(|(board, _)| board),
            Command::RemoveCard { column_id, item, .. } => board
                .with_card_removed(column_id, item.id())
                .map(|(board, _, _)| board),
            Command::AddColumn { column, index } => {
                Some(board.with_column_inserted(column.clone(), Some(*index)).0)
            }
            Command::RemoveColumn { column, .. } => {
                board.with_column_removed(&column.id).map(|(board, _, _)| board)
            }
        };
        next.unwrap_or_else(|| {
            log::warn!("Could not apply {}: target no longer exists", self.label());
            board.clone()
        })
    }
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo_stack: VecDeque<Command<T>>,
    redo_stack: Vec<Command<T>>,
    max_size: usize,
}

impl<T: BoardItem> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl<T: BoardItem> History<T> {
    /// Create an empty history keeping at most `max_size` undo steps.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the bound, evicting the oldest entries if needed.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict();
    }

    fn evict(&mut self) {
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
    }

    /// Record a freshly applied command. Clears the redo stack.
    pub fn record(&mut self, command: Command<T>) {
        log::debug!("History: recorded {}", command.label());
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        self.evict();
    }

    /// Undo the most recent command against `board`.
    ///
    /// Returns the resulting board, or `None` if there is nothing to undo.
    pub fn undo(&mut self, board: &Board<T>) -> Option<Board<T>> {
        let command = self.undo_stack.pop_back()?;
        log::debug!("History: undo {}", command.label());
        let next = command.inverse().apply(board);
        self.redo_stack.push(command);
        Some(next)
    }

    /// Redo the most recently undone command against `board`.
    pub fn redo(&mut self, board: &Board<T>) -> Option<Board<T>> {
        let command = self.redo_stack.pop()?;
        log::debug!("History: redo {}", command.label());
        let next = command.apply(board);
        self.undo_stack.push_back(command);
        self.evict();
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len_undo(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn len_redo(&self) -> usize {
        self.redo_stack.len()
    }
}
