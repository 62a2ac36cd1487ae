//! Card and column drag state machines.
//!
//! Card drags move through `Idle → Dragging ⇄ OverDropTarget → Idle`. Column
//! drags only know `Idle` and `Dragging`. Mutable bookkeeping for one
//! gesture (debounce clock, live position of the card) lives in a
//! [`DragSession`] that is created at drag start and dropped at drag end.

use crate::id::ColumnId;
use crate::registry::DropTarget;
use kurbo::{Point, Rect, Vec2};
use std::time::{Duration, Instant};

/// Fields shared by every active card-drag state.
#[derive(Debug, Clone, PartialEq)]
pub struct DragInfo<T> {
    pub item: T,
    pub source_column_id: ColumnId,
    pub source_index: usize,
    pub pointer: Point,
    /// Pointer position relative to the card's origin at grab time.
    pub touch_offset: Vec2,
}

impl<T> DragInfo<T> {
    /// Where the floating card's origin should be drawn.
    pub fn card_origin(&self) -> Point {
        self.pointer - self.touch_offset
    }
}

/// Card drag state.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState<T> {
    Idle,
    Dragging(DragInfo<T>),
    OverDropTarget { drag: DragInfo<T>, target: DropTarget },
}

impl<T> Default for DragState<T> {
    fn default() -> Self {
        DragState::Idle
    }
}

impl<T> DragState<T> {
    pub fn is_active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }

    pub fn info(&self) -> Option<&DragInfo<T>> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(drag) | DragState::OverDropTarget { drag, .. } => Some(drag),
        }
    }

    pub fn target(&self) -> Option<&DropTarget> {
        match self {
            DragState::OverDropTarget { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Update the pointer position of an active drag.
    pub(crate) fn set_pointer(&mut self, pointer: Point) {
        match self {
            DragState::Idle => {}
            DragState::Dragging(drag) | DragState::OverDropTarget { drag, .. } => {
                drag.pointer = pointer
            }
        }
    }

    /// Transition to `OverDropTarget` (or `Dragging` when `target` is none).
    pub(crate) fn set_target(&mut self, target: Option<DropTarget>) {
        let current = std::mem::take(self);
        *self = match (current, target) {
            (DragState::Idle, _) => DragState::Idle,
            (DragState::Dragging(drag) | DragState::OverDropTarget { drag, .. }, Some(target)) => {
                DragState::OverDropTarget { drag, target }
            }
            (DragState::Dragging(drag) | DragState::OverDropTarget { drag, .. }, None) => {
                DragState::Dragging(drag)
            }
        };
    }

    /// Return to `Idle`, handing back the finished drag.
    pub(crate) fn finish(&mut self) -> Option<DragInfo<T>> {
        match std::mem::take(self) {
            DragState::Idle => None,
            DragState::Dragging(drag) | DragState::OverDropTarget { drag, .. } => Some(drag),
        }
    }
}

/// Per-gesture trackers for a live card drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub started_at: Instant,
    last_move_at: Option<Instant>,
    /// Column the card currently lives in after live reordering.
    pub current_column: ColumnId,
    pub current_index: usize,
    /// Last measured height of the dragged card.
    pub card_height: f64,
    /// Last known rectangle of the column the card is in.
    pub column_bounds: Option<Rect>,
}

impl DragSession {
    pub fn new(
        column: ColumnId,
        index: usize,
        card_height: f64,
        column_bounds: Option<Rect>,
        now: Instant,
    ) -> Self {
        Self {
            started_at: now,
            last_move_at: None,
            current_column: column,
            current_index: index,
            card_height,
            column_bounds,
        }
    }

    /// Whether enough time has passed since the last live move.
    pub fn can_move(&self, now: Instant, debounce: Duration) -> bool {
        self.last_move_at
            .is_none_or(|last| now.saturating_duration_since(last) >= debounce)
    }

    pub fn record_move(&mut self, column: ColumnId, index: usize, now: Instant) {
        self.current_column = column;
        self.current_index = index;
        self.last_move_at = Some(now);
    }

    /// Whether `target` differs from where the card currently sits.
    pub fn is_new_position(&self, target: &DropTarget) -> bool {
        target.column_id != self.current_column || target.index != self.current_index
    }

    /// Point used for drop-zone lookup: the vertical center of the floating
    /// card. The raw pointer leaves a card-height dead zone at the top of
    /// each column.
    pub fn card_center_point(&self, pointer: Point, touch_offset: Vec2) -> Point {
        let top = pointer.y - touch_offset.y;
        Point::new(pointer.x, top + self.card_height / 2.0)
    }
}

/// Column reorder drag state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnDragState {
    #[default]
    Idle,
    Dragging {
        column_id: ColumnId,
        source_index: usize,
        pointer: Point,
    },
}

impl ColumnDragState {
    pub fn is_active(&self) -> bool {
        matches!(self, ColumnDragState::Dragging { .. })
    }

    pub fn column_id(&self) -> Option<&ColumnId> {
        match self {
            ColumnDragState::Dragging { column_id, .. } => Some(column_id),
            ColumnDragState::Idle => None,
        }
    }
}

/// Where a dragged column should move, given its neighbors' rectangles.
///
/// The column swaps with a neighbor once the pointer crosses that
/// neighbor's horizontal midpoint.
pub fn column_swap_index(
    pointer_x: f64,
    index: usize,
    left: Option<Rect>,
    right: Option<Rect>,
) -> Option<usize> {
    if let Some(right) = right {
        if pointer_x > right.center().x {
            return Some(index + 1);
        }
    }
    if let Some(left) = left {
        if pointer_x < left.center().x && index > 0 {
            return Some(index - 1);
        }
    }
    None
}
