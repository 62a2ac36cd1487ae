//! Cardflow Core Library
//!
//! Drag-and-drop interaction engine for Kanban-style boards: board data with
//! undo/redo, drop-zone resolution, live reordering, edge auto-scroll and a
//! zoomed-out overview for long cross-column drags.

pub mod autoscroll;
pub mod board;
pub mod color;
pub mod config;
pub mod drag;
pub mod engine;
pub mod gesture;
pub mod history;
pub mod id;
pub mod registry;
pub mod store;
pub mod ticker;
pub mod zoom;

pub use autoscroll::{AutoScroller, Axis, ScrollTarget, calculate_scroll_speed};
pub use board::{Board, BoardItem, CardLocation, Column};
pub use color::SerializableColor;
pub use config::{AnimationDriver, BoardConfig, ConfigError};
pub use drag::{ColumnDragState, DragInfo, DragSession, DragState};
pub use engine::{BoardEngine, BoardListener, NoopListener};
pub use gesture::{
    GestureOrchestrator, GestureOutcome, PointerEvent, PressTarget, ScrollHost, ScrollLock,
};
pub use history::{Command, History, DEFAULT_MAX_HISTORY};
pub use id::{BoardId, CardId, ColumnId, Id};
pub use registry::{DropTarget, DropZoneRegistry};
pub use store::BoardStore;
pub use zoom::{ZoomController, ZoomPhase, ZoomState};
