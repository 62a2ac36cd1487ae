//! Pointer gesture recognition in front of the engine.
//!
//! A press only becomes a drag after it has been held still for the
//! long-press duration. Until then the orchestrator does not consume
//! pointer events, so scrolling is never blocked by a plain touch-down.

use crate::board::BoardItem;
use crate::config::BoardConfig;
use crate::engine::BoardEngine;
use crate::id::{CardId, ColumnId};
use kurbo::{Point, Rect};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a press landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum PressTarget {
    /// A card, with its on-screen rectangle at press time.
    Card { card_id: CardId, bounds: Rect },
    /// A column header.
    Column { column_id: ColumnId },
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down {
        position: Point,
        target: PressTarget,
        at: Instant,
    },
    Move {
        position: Point,
        at: Instant,
    },
    Up {
        position: Point,
        at: Instant,
    },
    Cancel {
        at: Instant,
    },
}

/// Result of feeding one event to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Press is being held; nothing decided yet.
    Pending,
    /// Not ours: the host should scroll or otherwise handle the event.
    PassThrough,
    Click,
    DragStarted,
    ColumnDragStarted,
    Dragged,
    Dropped,
    Cancelled,
    /// No gesture in progress.
    Ignored,
}

/// The scrollable container hosting the board.
pub trait ScrollHost {
    fn set_user_scroll_enabled(&self, enabled: bool);
}

/// Disables user scrolling on a host while alive.
pub struct ScrollLock {
    host: Arc<dyn ScrollHost>,
}

impl ScrollLock {
    pub fn acquire(host: Arc<dyn ScrollHost>) -> Self {
        host.set_user_scroll_enabled(false);
        Self { host }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.host.set_user_scroll_enabled(true);
    }
}

impl std::fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ScrollLock")
    }
}

#[derive(Debug, Clone)]
struct Press {
    origin: Point,
    position: Point,
    target: PressTarget,
    at: Instant,
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Pressed(Press),
    PassThrough,
    CardDrag(Option<ScrollLock>),
    ColumnDrag(Option<ScrollLock>),
}

/// Turns raw pointer events into clicks and drags on a [`BoardEngine`].
pub struct GestureOrchestrator {
    long_press: Duration,
    touch_slop: f64,
    scroll_host: Option<Arc<dyn ScrollHost>>,
    phase: Phase,
}

impl std::fmt::Debug for GestureOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureOrchestrator")
            .field("long_press", &self.long_press)
            .field("touch_slop", &self.touch_slop)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl GestureOrchestrator {
    pub fn new(long_press: Duration, touch_slop: f64) -> Self {
        Self {
            long_press,
            touch_slop,
            scroll_host: None,
            phase: Phase::Idle,
        }
    }

    /// Orchestrator using the long-press and slop values of `config`.
    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(config.long_press(), config.touch_slop)
    }

    /// Host whose scrolling is suspended while a drag is in progress.
    pub fn with_scroll_host(mut self, host: Arc<dyn ScrollHost>) -> Self {
        self.scroll_host = Some(host);
        self
    }

    /// Whether pointer events are currently consumed by a drag.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::CardDrag(_) | Phase::ColumnDrag(_))
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.phase, Phase::Pressed(_))
    }

    /// Feed one pointer event.
    pub fn handle<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        event: PointerEvent,
    ) -> GestureOutcome {
        match event {
            PointerEvent::Down {
                position,
                target,
                at,
            } => self.on_down(engine, position, target, at),
            PointerEvent::Move { position, at } => self.on_move(engine, position, at),
            PointerEvent::Up { position, at } => self.on_up(engine, position, at),
            PointerEvent::Cancel { at } => self.on_cancel(engine, at),
        }
    }

    /// Promote a press that has been held still past the long-press duration.
    ///
    /// Hosts call this from a frame timer so a press becomes a drag without
    /// waiting for the next pointer event.
    pub fn tick<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        now: Instant,
    ) -> GestureOutcome {
        match &self.phase {
            Phase::Pressed(press) if self.held_long_enough(press, now) => {
                let press = press.clone();
                self.promote(engine, press, now)
            }
            Phase::Pressed(_) => GestureOutcome::Pending,
            _ => GestureOutcome::Ignored,
        }
    }

    fn held_long_enough(&self, press: &Press, now: Instant) -> bool {
        now.saturating_duration_since(press.at) >= self.long_press
    }

    fn on_down<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        position: Point,
        target: PressTarget,
        at: Instant,
    ) -> GestureOutcome {
        if !matches!(self.phase, Phase::Idle) {
            // A second pointer or a lost up event: finish what was running.
            self.teardown(engine, at, true);
        }
        self.phase = Phase::Pressed(Press {
            origin: position,
            position,
            target,
            at,
        });
        GestureOutcome::Pending
    }

    fn on_move<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        position: Point,
        at: Instant,
    ) -> GestureOutcome {
        match &mut self.phase {
            Phase::Idle => GestureOutcome::Ignored,
            Phase::PassThrough => GestureOutcome::PassThrough,
            Phase::Pressed(press) => {
                // Slop only cancels a press that has not yet timed out.
                if at.saturating_duration_since(press.at) >= self.long_press {
                    let press = press.clone();
                    return match self.promote(engine, press, at) {
                        GestureOutcome::DragStarted | GestureOutcome::ColumnDragStarted => {
                            self.on_move(engine, position, at)
                        }
                        outcome => outcome,
                    };
                }
                if (position - press.origin).hypot() > self.touch_slop {
                    log::trace!("Press moved beyond slop, passing through");
                    self.phase = Phase::PassThrough;
                    return GestureOutcome::PassThrough;
                }
                press.position = position;
                GestureOutcome::Pending
            }
            Phase::CardDrag(_) => {
                engine.update_drag(position, at);
                GestureOutcome::Dragged
            }
            Phase::ColumnDrag(_) => {
                engine.update_column_drag(position);
                GestureOutcome::Dragged
            }
        }
    }

    fn on_up<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        position: Point,
        at: Instant,
    ) -> GestureOutcome {
        if let Phase::Pressed(press) = &self.phase {
            if !self.held_long_enough(press, at) {
                let target = press.target.clone();
                self.phase = Phase::Idle;
                if let PressTarget::Card { card_id, .. } = target {
                    engine.click_card(&card_id);
                }
                return GestureOutcome::Click;
            }
            // Released after the timeout before any tick arrived.
            let press = press.clone();
            self.promote(engine, press, at);
        }
        match &self.phase {
            Phase::CardDrag(_) => engine.update_drag(position, at),
            Phase::ColumnDrag(_) => {
                engine.update_column_drag(position);
            }
            _ => {}
        }
        self.teardown(engine, at, false)
    }

    fn on_cancel<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        at: Instant,
    ) -> GestureOutcome {
        self.teardown(engine, at, true)
    }

    /// Start the drag a press stands for.
    fn promote<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        press: Press,
        now: Instant,
    ) -> GestureOutcome {
        let started = match &press.target {
            PressTarget::Card { card_id, bounds } => match engine.find_card(card_id) {
                Some(location) => {
                    let started = engine.start_drag(
                        location.item,
                        location.column_id,
                        location.index,
                        press.position,
                        press.origin - bounds.origin(),
                        now,
                    );
                    if started {
                        engine.set_card_height(bounds.height());
                    }
                    started.then_some(GestureOutcome::DragStarted)
                }
                None => None,
            },
            PressTarget::Column { column_id } => engine
                .start_column_drag(column_id, press.position)
                .then_some(GestureOutcome::ColumnDragStarted),
        };

        let lock = || self.scroll_host.clone().map(ScrollLock::acquire);
        match started {
            Some(GestureOutcome::DragStarted) => {
                log::debug!("Long press promoted to card drag");
                self.phase = Phase::CardDrag(lock());
                GestureOutcome::DragStarted
            }
            Some(outcome) => {
                log::debug!("Long press promoted to column drag");
                self.phase = Phase::ColumnDrag(lock());
                outcome
            }
            None => {
                log::debug!("Long press refused by engine, passing through");
                self.phase = Phase::PassThrough;
                GestureOutcome::PassThrough
            }
        }
    }

    /// Return to idle, ending or cancelling whatever was running.
    ///
    /// Dropping the phase releases any scroll lock.
    fn teardown<T: BoardItem>(
        &mut self,
        engine: &mut BoardEngine<T>,
        at: Instant,
        cancelled: bool,
    ) -> GestureOutcome {
        let outcome = match std::mem::take(&mut self.phase) {
            Phase::Idle => GestureOutcome::Ignored,
            Phase::PassThrough => GestureOutcome::PassThrough,
            Phase::Pressed(_) => GestureOutcome::Cancelled,
            Phase::CardDrag(_lock) => {
                if cancelled {
                    engine.cancel_drag(at);
                    GestureOutcome::Cancelled
                } else {
                    engine.end_drag(at);
                    GestureOutcome::Dropped
                }
            }
            Phase::ColumnDrag(_lock) => {
                if cancelled {
                    engine.cancel_column_drag();
                    GestureOutcome::Cancelled
                } else {
                    engine.end_column_drag();
                    GestureOutcome::Dropped
                }
            }
        };
        engine.ensure_zoom_reset(at);
        outcome
    }
}
