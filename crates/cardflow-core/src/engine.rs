//! The board engine: drag interaction over a board store.
//!
//! [`BoardEngine`] owns the board store, the drop-zone registry, both drag
//! state machines, the zoom controller and the auto-scroller. It is driven
//! from a single UI thread; only the animation and scroll loops run on
//! worker threads, and those never touch board data.

use crate::autoscroll::{AutoScroller, Axis, ScrollTarget, calculate_scroll_speed};
use crate::board::{Board, BoardItem, CardLocation, Column};
use crate::config::{BoardConfig, ConfigError};
use crate::drag::{ColumnDragState, DragInfo, DragSession, DragState, column_swap_index};
use crate::id::{CardId, ColumnId};
use crate::registry::{DropTarget, DropZoneRegistry};
use crate::store::BoardStore;
use crate::zoom::{ZoomController, ZoomPhase, exits_column};
use kurbo::{Point, Rect, Vec2};
use std::sync::Arc;
use std::time::Instant;

/// Callbacks from the engine to the application.
///
/// Every method has a default, so listeners only implement what they need.
pub trait BoardListener<T> {
    /// A card was relocated by a drag (live reorder or overview drop).
    fn on_card_moved(
        &mut self,
        _card_id: &CardId,
        _from_column: &ColumnId,
        _to_column: &ColumnId,
        _from_index: usize,
        _to_index: usize,
    ) {
    }

    fn on_drag_start(&mut self, _item: &T) {}

    fn on_drag_end(&mut self, _item: &T, _cancelled: bool) {}

    fn on_card_click(&mut self, _item: &T) {}

    /// Veto hook consulted before every committing drag move.
    fn can_move_card(&self, _card_id: &CardId, _to_column: &ColumnId) -> bool {
        true
    }
}

/// Listener that ignores every event and allows every move.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl<T> BoardListener<T> for NoopListener {}

/// Interactive board engine.
pub struct BoardEngine<T: BoardItem> {
    config: BoardConfig,
    store: BoardStore<T>,
    registry: DropZoneRegistry,
    drag: DragState<T>,
    session: Option<DragSession>,
    column_drag: ColumnDragState,
    zoom: ZoomController,
    scroller: AutoScroller,
    viewport: Option<Rect>,
    vertical_scroll: Option<Arc<dyn ScrollTarget>>,
    horizontal_scroll: Option<Arc<dyn ScrollTarget>>,
    listener: Box<dyn BoardListener<T>>,
}

impl<T: BoardItem> std::fmt::Debug for BoardEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardEngine")
            .field("board", self.store.current())
            .field("drag", &self.drag)
            .field("column_drag", &self.column_drag)
            .field("zoom", &self.zoom.phase())
            .finish_non_exhaustive()
    }
}

impl<T: BoardItem> BoardEngine<T> {
    /// Create an engine with the default configuration.
    pub fn new(board: Board<T>) -> Self {
        Self::build(board, BoardConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn try_new(board: Board<T>, config: BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(board, config))
    }

    fn build(board: Board<T>, config: BoardConfig) -> Self {
        Self {
            store: BoardStore::new(board, config.max_history_size),
            registry: DropZoneRegistry::new(),
            drag: DragState::Idle,
            session: None,
            column_drag: ColumnDragState::Idle,
            zoom: ZoomController::new(
                config.animation_driver,
                config.zoom_out_duration(),
                config.zoom_in_duration(),
            ),
            scroller: AutoScroller::new(),
            viewport: None,
            vertical_scroll: None,
            horizontal_scroll: None,
            listener: Box::new(NoopListener),
            config,
        }
    }

    /// Install the application listener.
    pub fn with_listener(mut self, listener: Box<dyn BoardListener<T>>) -> Self {
        self.listener = listener;
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn BoardListener<T>>) {
        self.listener = listener;
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Current board snapshot.
    pub fn board(&self) -> Arc<Board<T>> {
        self.store.board()
    }

    /// Replace the board wholesale, resetting drag, zoom and history state.
    pub fn set_board(&mut self, board: Board<T>) {
        self.drag = DragState::Idle;
        self.session = None;
        self.column_drag = ColumnDragState::Idle;
        self.zoom.reset();
        self.scroller.stop_all();
        self.registry.clear();
        self.store.set_board(board);
    }

    pub fn store(&self) -> &BoardStore<T> {
        &self.store
    }

    pub fn move_card(
        &mut self,
        card_id: &CardId,
        to_column_id: &ColumnId,
        to_index: usize,
    ) -> bool {
        self.store.move_card(card_id, to_column_id, to_index)
    }

    pub fn add_card(&mut self, column_id: &ColumnId, item: T, index: Option<usize>) -> bool {
        self.store.add_card(column_id, item, index)
    }

    pub fn remove_card(&mut self, column_id: &ColumnId, card_id: &CardId) -> bool {
        self.store.remove_card(column_id, card_id)
    }

    pub fn add_column(&mut self, column: Column<T>, index: Option<usize>) -> bool {
        self.store.add_column(column, index)
    }

    pub fn remove_column(&mut self, column_id: &ColumnId) -> bool {
        self.store.remove_column(column_id)
    }

    pub fn move_column(&mut self, from_index: usize, to_index: usize) -> bool {
        self.store.move_column(from_index, to_index)
    }

    pub fn find_card(&self, card_id: &CardId) -> Option<CardLocation<T>> {
        self.store.find_card(card_id)
    }

    pub fn update_card(&mut self, card_id: &CardId, updater: impl FnOnce(&T) -> T) -> bool {
        self.store.update_card(card_id, updater)
    }

    pub fn update_column(
        &mut self,
        column_id: &ColumnId,
        updater: impl FnOnce(&mut Column<T>),
    ) -> bool {
        self.store.update_column(column_id, updater)
    }

    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    pub fn registry(&self) -> &DropZoneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DropZoneRegistry {
        &mut self.registry
    }

    /// Visible rectangle of the board, used for edge auto-scrolling.
    pub fn set_viewport(&mut self, viewport: Option<Rect>) {
        self.viewport = viewport;
    }

    /// Containers scrolled by the auto-scroller.
    pub fn set_scroll_targets(
        &mut self,
        vertical: Option<Arc<dyn ScrollTarget>>,
        horizontal: Option<Arc<dyn ScrollTarget>>,
    ) {
        self.scroller.stop_all();
        self.vertical_scroll = vertical;
        self.horizontal_scroll = horizontal;
    }

    pub fn auto_scroller(&self) -> &AutoScroller {
        &self.scroller
    }

    pub fn drag_state(&self) -> &DragState<T> {
        &self.drag
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Begin dragging a card. Only valid while no drag is active.
    pub fn start_drag(
        &mut self,
        item: T,
        column_id: ColumnId,
        index: usize,
        pointer: Point,
        touch_offset: Vec2,
        now: Instant,
    ) -> bool {
        if !self.config.enable_card_drag || self.drag.is_active() || self.column_drag.is_active() {
            return false;
        }
        let card_height = self
            .registry
            .card_bounds(item.id())
            .map(|bounds| bounds.height())
            .unwrap_or(0.0);
        let column_bounds = self.registry.column_bounds(&column_id);

        log::debug!("Drag started: card {} from {}[{}]", item.id(), column_id, index);
        self.session = Some(DragSession::new(
            column_id.clone(),
            index,
            card_height,
            column_bounds,
            now,
        ));
        self.drag = DragState::Dragging(DragInfo {
            item,
            source_column_id: column_id,
            source_index: index,
            pointer,
            touch_offset,
        });
        if let Some(drag) = self.drag.info() {
            self.listener.on_drag_start(&drag.item);
        }
        true
    }

    /// Latest measured height of the dragged card.
    pub fn set_card_height(&mut self, height: f64) {
        if let Some(session) = &mut self.session {
            session.card_height = height;
        }
    }

    /// Feed a pointer position of the active drag.
    pub fn update_drag(&mut self, pointer: Point, now: Instant) {
        if !self.drag.is_active() {
            return;
        }
        self.drag.set_pointer(pointer);
        if let Some(session) = &mut self.session {
            if let Some(bounds) = self.registry.column_bounds(&session.current_column) {
                session.column_bounds = Some(bounds);
            }
        }
        self.auto_scroll(pointer);

        match self.zoom.phase() {
            ZoomPhase::Normal => {
                let left_column = self
                    .session
                    .as_ref()
                    .and_then(|session| session.column_bounds)
                    .is_some_and(|bounds| exits_column(pointer, bounds));
                if self.config.enable_zoom_out_drag && left_column {
                    self.zoom.start_zoom_out_transition(now);
                    self.refresh_overlay_target();
                } else {
                    self.live_reorder(pointer, now);
                }
            }
            ZoomPhase::ZoomingOut | ZoomPhase::Miniature => self.refresh_overlay_target(),
            ZoomPhase::ZoomingIn => self.drag.set_target(None),
        }
    }

    fn live_reorder(&mut self, pointer: Point, now: Instant) {
        let (Some(session), Some(drag)) = (self.session.as_ref(), self.drag.info()) else {
            return;
        };
        let card_id = drag.item.id().clone();
        let center = session.card_center_point(pointer, drag.touch_offset);
        let target = self
            .registry
            .find_drop_target(center, &card_id, &session.current_column);
        let ready = session.can_move(now, self.config.move_debounce());
        let from_column = session.current_column.clone();
        let from_index = session.current_index;
        let moves = target
            .as_ref()
            .is_some_and(|target| session.is_new_position(target));
        self.drag.set_target(target.clone());

        let Some(target) = target.filter(|_| moves) else {
            return;
        };
        if !ready {
            log::trace!("Live move to {}[{}] debounced", target.column_id, target.index);
            return;
        }
        if !self.allows_move(&card_id, &from_column, &target.column_id) {
            return;
        }

        let moved = self.store.move_card(&card_id, &target.column_id, target.index);
        let Some(location) = self.store.find_card(&card_id) else {
            return;
        };
        let column_bounds = self.registry.column_bounds(&location.column_id);
        if let Some(session) = &mut self.session {
            if moved {
                session.record_move(location.column_id.clone(), location.index, now);
            } else {
                session.current_column = location.column_id.clone();
                session.current_index = location.index;
            }
            if column_bounds.is_some() {
                session.column_bounds = column_bounds;
            }
        }
        if moved {
            self.listener.on_card_moved(
                &card_id,
                &from_column,
                &location.column_id,
                from_index,
                location.index,
            );
        }
    }

    /// Target while the overview is showing: the end of the hovered column.
    fn refresh_overlay_target(&mut self) {
        if !self.drag.is_active() {
            return;
        }
        let target = self.zoom.hovered_overlay_column().and_then(|column_id| {
            let len = self.store.current().column(&column_id)?.len();
            Some(DropTarget { column_id, index: len })
        });
        self.drag.set_target(target);
    }

    /// WIP enforcement and the application veto.
    fn allows_move(&self, card_id: &CardId, from_column: &ColumnId, to_column: &ColumnId) -> bool {
        if self.config.enforce_wip_limits && from_column != to_column {
            let full = self
                .store
                .current()
                .column(to_column)
                .is_some_and(|column| column.is_full());
            if full {
                log::warn!(
                    "Move of card {} vetoed: column {} is at its WIP limit",
                    card_id,
                    to_column
                );
                return false;
            }
        }
        if !self.listener.can_move_card(card_id, to_column) {
            log::warn!("Move of card {} to {} vetoed by listener", card_id, to_column);
            return false;
        }
        true
    }

    /// Move a card to the end of a column.
    ///
    /// Dropping a card onto the column it already lives in succeeds without
    /// reordering.
    pub fn drop_to_column(&mut self, card_id: &CardId, column_id: &ColumnId) -> bool {
        let Some(from) = self.store.find_card(card_id) else {
            return false;
        };
        let Some(len) = self.store.current().column(column_id).map(Column::len) else {
            return false;
        };
        if &from.column_id == column_id {
            return true;
        }
        if !self.allows_move(card_id, &from.column_id, column_id) {
            return false;
        }
        if !self.store.move_card(card_id, column_id, len) {
            return false;
        }
        log::debug!("Dropped card {} into {}", card_id, column_id);
        self.listener
            .on_card_moved(card_id, &from.column_id, column_id, from.index, len);
        true
    }

    /// Finish the active drag.
    ///
    /// A drag released over a miniature column is moved to the end of that
    /// column; otherwise live reordering already put the card in place.
    /// Returns whether a drag was active.
    pub fn end_drag(&mut self, now: Instant) -> bool {
        if !self.drag.is_active() {
            return false;
        }
        if self.zoom.phase().is_overview() {
            let card_id = self.drag.info().map(|drag| drag.item.id().clone());
            let column_id = self.zoom.hovered_overlay_column();
            if let (Some(card_id), Some(column_id)) = (card_id, column_id) {
                self.drop_to_column(&card_id, &column_id);
            }
            self.zoom.start_zoom_in_transition(now);
        }
        self.finish_drag(false);
        true
    }

    /// Abort the active drag without finalizing an overview drop.
    pub fn cancel_drag(&mut self, now: Instant) -> bool {
        if !self.drag.is_active() {
            return false;
        }
        if self.zoom.phase().is_overview() {
            self.zoom.start_zoom_in_transition(now);
        }
        self.finish_drag(true);
        true
    }

    fn finish_drag(&mut self, cancelled: bool) {
        self.session = None;
        self.scroller.stop_all();
        if let Some(drag) = self.drag.finish() {
            log::debug!(
                "Drag {}: card {}",
                if cancelled { "cancelled" } else { "ended" },
                drag.item.id()
            );
            let item = self
                .store
                .find_card(drag.item.id())
                .map(|location| location.item)
                .unwrap_or(drag.item);
            self.listener.on_drag_end(&item, cancelled);
        }
    }

    /// Report a click (press released before the long-press timeout).
    pub fn click_card(&mut self, card_id: &CardId) -> bool {
        let Some(location) = self.store.find_card(card_id) else {
            return false;
        };
        self.listener.on_card_click(&location.item);
        true
    }

    pub fn zoom_phase(&self) -> ZoomPhase {
        self.zoom.phase()
    }

    pub fn zoom_progress(&self) -> f64 {
        self.zoom.progress()
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn start_zoom_out_transition(&mut self, now: Instant) -> bool {
        self.zoom.start_zoom_out_transition(now)
    }

    pub fn start_zoom_in_transition(&mut self, now: Instant) -> bool {
        self.zoom.start_zoom_in_transition(now)
    }

    /// Advance animations when using the manual driver.
    pub fn tick_animations(&mut self, now: Instant) -> bool {
        self.zoom.tick(now)
    }

    /// Safety net for gesture teardown paths.
    pub fn ensure_zoom_reset(&mut self, now: Instant) -> bool {
        self.zoom.ensure_zoom_reset(self.drag.is_active(), now)
    }

    pub fn hovered_overlay_column(&self) -> Option<ColumnId> {
        self.zoom.hovered_overlay_column()
    }

    pub fn set_hovered_overlay_column(&mut self, column_id: Option<ColumnId>) {
        self.zoom.set_hovered_overlay_column(column_id);
        if self.zoom.phase().is_overview() {
            self.refresh_overlay_target();
        }
    }

    /// Hover test against the miniature column rectangles.
    pub fn update_overlay_hover(
        &mut self,
        position: Point,
        columns: &[(ColumnId, Rect)],
    ) -> Option<ColumnId> {
        let hovered = self.zoom.update_overlay_hover(position, columns);
        if self.zoom.phase().is_overview() {
            self.refresh_overlay_target();
        }
        hovered
    }

    fn auto_scroll(&mut self, pointer: Point) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let max_speed = self.config.max_scroll_speed;
        let edge = self.config.scroll_edge_zone;

        if let Some(target) = &self.vertical_scroll {
            let speed = edge_speed(pointer.y, viewport.y0, viewport.y1, edge, max_speed);
            self.scroller.update(Axis::Vertical, target, speed);
        }
        if let Some(target) = &self.horizontal_scroll {
            let speed = edge_speed(pointer.x, viewport.x0, viewport.x1, edge, max_speed);
            self.scroller.update(Axis::Horizontal, target, speed);
        }
    }

    pub fn column_drag_state(&self) -> &ColumnDragState {
        &self.column_drag
    }

    pub fn start_column_drag(&mut self, column_id: &ColumnId, pointer: Point) -> bool {
        if !self.config.enable_column_reorder
            || self.column_drag.is_active()
            || self.drag.is_active()
        {
            return false;
        }
        let Some(source_index) = self.store.current().column_index(column_id) else {
            return false;
        };
        log::debug!("Column drag started: {} at {}", column_id, source_index);
        self.column_drag = ColumnDragState::Dragging {
            column_id: column_id.clone(),
            source_index,
            pointer,
        };
        true
    }

    /// Feed a pointer position of the active column drag.
    ///
    /// Returns whether the column was swapped with a neighbor.
    pub fn update_column_drag(&mut self, pointer: Point) -> bool {
        let ColumnDragState::Dragging {
            column_id,
            pointer: current,
            ..
        } = &mut self.column_drag
        else {
            return false;
        };
        *current = pointer;
        let column_id = column_id.clone();

        let board = self.store.board();
        let Some(index) = board.column_index(&column_id) else {
            return false;
        };
        let bounds_at = |i: usize| {
            board
                .columns
                .get(i)
                .and_then(|column| self.registry.column_bounds(&column.id))
        };
        let left = index.checked_sub(1).and_then(|i| bounds_at(i));
        let right = bounds_at(index + 1);
        let Some(to_index) = column_swap_index(pointer.x, index, left, right) else {
            return false;
        };
        log::debug!("Column {} moved {} -> {}", column_id, index, to_index);
        self.store.move_column(index, to_index)
    }

    pub fn end_column_drag(&mut self) -> bool {
        let active = self.column_drag.is_active();
        self.column_drag = ColumnDragState::Idle;
        active
    }

    pub fn cancel_column_drag(&mut self) -> bool {
        self.end_column_drag()
    }
}

/// Signed auto-scroll speed for a pointer coordinate within `[start, end]`.
fn edge_speed(position: f64, start: f64, end: f64, zone_fraction: f64, max_speed: f64) -> f64 {
    let zone = (end - start) * zone_fraction;
    if position < start + zone {
        -calculate_scroll_speed((position - start).max(0.0), zone, max_speed)
    } else if position > end - zone {
        calculate_scroll_speed((end - position).max(0.0), zone, max_speed)
    } else {
        0.0
    }
}

impl<T: BoardItem> Drop for BoardEngine<T> {
    fn drop(&mut self) {
        self.scroller.stop_all();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::board::test_support::TestCard;

    /// Report a layout for the current board: column `i` spans
    /// x∈[200i, 200i+200], cards are 50px tall with 10px gaps.
    pub fn report_layout(engine: &mut BoardEngine<TestCard>) {
        let board = engine.board();
        let registry = engine.registry_mut();
        for (ci, column) in board.columns.iter().enumerate() {
            let x0 = ci as f64 * 200.0;
            let column_rect = Rect::new(x0, 0.0, x0 + 200.0, 500.0);
            registry.register_column(column.id.clone(), ci, column_rect);
            for (i, item) in column.items.iter().enumerate() {
                let y0 = 10.0 + i as f64 * 60.0;
                let card_rect = Rect::new(x0, y0, x0 + 200.0, y0 + 50.0);
                registry.register_card(item.id.clone(), column.id.clone(), i, card_rect);
            }
        }
    }
}
