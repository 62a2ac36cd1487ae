//! Session replay: drive an engine from a scripted pointer session.

use crate::layout::GridLayout;
use cardflow_core::{
    AnimationDriver, Board, BoardConfig, BoardEngine, BoardItem, BoardListener, CardId, ColumnId,
    ConfigError, GestureOrchestrator, GestureOutcome, PointerEvent, PressTarget,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid session: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Event {index} presses unknown card {card_id}")]
    UnknownCard { index: usize, card_id: CardId },
    #[error("Event {index} presses nothing")]
    NoPressTarget { index: usize },
}

/// Card payload used by replay sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayCard {
    pub id: CardId,
    #[serde(default)]
    pub title: String,
}

impl BoardItem for ReplayCard {
    fn id(&self) -> &CardId {
        &self.id
    }
}

/// One scripted input, `at_ms` milliseconds after the session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    Down {
        at_ms: u64,
        x: f64,
        y: f64,
        #[serde(default)]
        card: Option<CardId>,
        #[serde(default)]
        column: Option<ColumnId>,
    },
    Move {
        at_ms: u64,
        x: f64,
        y: f64,
    },
    Up {
        at_ms: u64,
        x: f64,
        y: f64,
    },
    Cancel {
        at_ms: u64,
    },
    Tick {
        at_ms: u64,
    },
    Undo {
        at_ms: u64,
    },
    Redo {
        at_ms: u64,
    },
}

impl ScriptEvent {
    pub fn at_ms(&self) -> u64 {
        match self {
            ScriptEvent::Down { at_ms, .. }
            | ScriptEvent::Move { at_ms, .. }
            | ScriptEvent::Up { at_ms, .. }
            | ScriptEvent::Cancel { at_ms }
            | ScriptEvent::Tick { at_ms }
            | ScriptEvent::Undo { at_ms }
            | ScriptEvent::Redo { at_ms } => *at_ms,
        }
    }
}

/// A recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub board: Board<ReplayCard>,
    #[serde(default)]
    pub config: BoardConfig,
    #[serde(default)]
    pub layout: GridLayout,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Logs every engine callback.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl BoardListener<ReplayCard> for LoggingListener {
    fn on_card_moved(
        &mut self,
        card_id: &CardId,
        from_column: &ColumnId,
        to_column: &ColumnId,
        from_index: usize,
        to_index: usize,
    ) {
        log::info!(
            "card moved: {} {}[{}] -> {}[{}]",
            card_id,
            from_column,
            from_index,
            to_column,
            to_index
        );
    }

    fn on_drag_start(&mut self, item: &ReplayCard) {
        log::info!("drag start: {} ({})", item.id, item.title);
    }

    fn on_drag_end(&mut self, item: &ReplayCard, cancelled: bool) {
        log::info!("drag end: {} cancelled={}", item.id, cancelled);
    }

    fn on_card_click(&mut self, item: &ReplayCard) {
        log::info!("card click: {} ({})", item.id, item.title);
    }
}

/// Play a session and return the final board.
///
/// Animations always use the manual driver so the outcome only depends on
/// the scripted timestamps.
pub fn run(session: Session) -> Result<Board<ReplayCard>, ReplayError> {
    let Session {
        board,
        config,
        layout,
        events,
    } = session;
    let config = BoardConfig {
        animation_driver: AnimationDriver::Manual,
        ..config
    };

    let mut engine = BoardEngine::try_new(board, config)?.with_listener(Box::new(LoggingListener));
    engine.set_viewport(layout.viewport);
    let mut gestures = GestureOrchestrator::from_config(engine.config());
    let start = Instant::now();
    layout.report(&mut engine);

    for (index, event) in events.into_iter().enumerate() {
        let at = start + Duration::from_millis(event.at_ms());
        engine.tick_animations(at);
        let outcome = match event {
            ScriptEvent::Down { x, y, card, column, .. } => {
                let target = press_target(&engine, index, card, column)?;
                let position = Point::new(x, y);
                gestures.handle(&mut engine, PointerEvent::Down { position, target, at })
            }
            ScriptEvent::Move { x, y, .. } => {
                let position = Point::new(x, y);
                if engine.zoom_phase().is_overview() {
                    let board = engine.board();
                    let minis = layout.overview_columns(&*board);
                    engine.update_overlay_hover(position, &minis);
                }
                gestures.handle(&mut engine, PointerEvent::Move { position, at })
            }
            ScriptEvent::Up { x, y, .. } => {
                let position = Point::new(x, y);
                gestures.handle(&mut engine, PointerEvent::Up { position, at })
            }
            ScriptEvent::Cancel { .. } => gestures.handle(&mut engine, PointerEvent::Cancel { at }),
            ScriptEvent::Tick { .. } => gestures.tick(&mut engine, at),
            ScriptEvent::Undo { .. } => {
                log::info!("undo: {}", engine.undo());
                GestureOutcome::Ignored
            }
            ScriptEvent::Redo { .. } => {
                log::info!("redo: {}", engine.redo());
                GestureOutcome::Ignored
            }
        };
        log::debug!("event {} at {}ms: {:?}", index, (at - start).as_millis(), outcome);
        layout.report(&mut engine);
    }

    Ok((*engine.board()).clone())
}

fn press_target(
    engine: &BoardEngine<ReplayCard>,
    index: usize,
    card: Option<CardId>,
    column: Option<ColumnId>,
) -> Result<PressTarget, ReplayError> {
    match (card, column) {
        (Some(card_id), _) => match engine.registry().card_bounds(&card_id) {
            Some(bounds) => Ok(PressTarget::Card { card_id, bounds }),
            None => Err(ReplayError::UnknownCard { index, card_id }),
        },
        (None, Some(column_id)) => Ok(PressTarget::Column { column_id }),
        (None, None) => Err(ReplayError::NoPressTarget { index }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BOARD: &str = r#"{
        "id": "board-1",
        "columns": [
            { "id": "todo", "title": "To do", "items": [
                { "id": "a", "title": "Write tests" },
                { "id": "b", "title": "Fix bug" },
                { "id": "c", "title": "Ship" }
            ] },
            { "id": "doing", "title": "Doing", "max_items": 2, "items": [
                { "id": "d", "title": "Review" }
            ] }
        ]
    }"#;

    fn session(events: &str, config: &str) -> Session {
        let json = format!(r#"{{ "board": {BOARD}, "config": {config}, "events": {events} }}"#);
        serde_json::from_str(&json).unwrap()
    }

    fn ids(board: &Board<ReplayCard>, column: &str) -> Vec<String> {
        board
            .column(&ColumnId::from(column))
            .map(|c| c.items.iter().map(|i| i.id.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_load_session_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "board": {BOARD} }}"#).unwrap();
        let session = Session::load(file.path()).unwrap();
        assert_eq!(session.board.columns.len(), 2);
        assert_eq!(session.config, BoardConfig::default());
        assert!(session.events.is_empty());
    }

    #[test]
    fn test_load_reports_errors() {
        let missing = Session::load(Path::new("/nonexistent/cardflow-session.json"));
        assert!(matches!(missing, Err(ReplayError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(Session::load(file.path()), Err(ReplayError::Json(_))));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let session = session("[]", r#"{ "max_history_size": 0 }"#);
        assert!(matches!(run(session), Err(ReplayError::Config(ConfigError::EmptyHistory))));
    }

    #[test]
    fn test_long_press_reorders_within_column() {
        // Card "a" spans y∈[40,100]; dragging its center from y=70 to y=150
        // puts it between "b" (center 138) and "c" (center 206).
        let events = r#"[
            { "type": "down", "at_ms": 0, "x": 100, "y": 70, "card": "a" },
            { "type": "tick", "at_ms": 500 },
            { "type": "move", "at_ms": 520, "x": 100, "y": 150 },
            { "type": "up", "at_ms": 600, "x": 100, "y": 150 }
        ]"#;
        let board = run(session(events, r#"{ "enable_zoom_out_drag": false }"#)).unwrap();
        assert_eq!(ids(&board, "todo"), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_overview_drop_and_undo() {
        let events = r#"[
            { "type": "down", "at_ms": 0, "x": 100, "y": 70, "card": "a" },
            { "type": "tick", "at_ms": 500 },
            { "type": "move", "at_ms": 520, "x": 300, "y": 70 },
            { "type": "tick", "at_ms": 900 },
            { "type": "move", "at_ms": 920, "x": 100, "y": 100 },
            { "type": "up", "at_ms": 940, "x": 100, "y": 100 },
            { "type": "tick", "at_ms": 1300 }
        ]"#;
        let board = run(session(events, "{}")).unwrap();
        assert_eq!(ids(&board, "todo"), vec!["b", "c"]);
        assert_eq!(ids(&board, "doing"), vec!["d", "a"]);

        let undo = r#"[
            { "type": "down", "at_ms": 0, "x": 100, "y": 70, "card": "a" },
            { "type": "tick", "at_ms": 500 },
            { "type": "move", "at_ms": 520, "x": 300, "y": 70 },
            { "type": "tick", "at_ms": 900 },
            { "type": "move", "at_ms": 920, "x": 100, "y": 100 },
            { "type": "up", "at_ms": 940, "x": 100, "y": 100 },
            { "type": "undo", "at_ms": 1000 }
        ]"#;
        let board = run(session(undo, "{}")).unwrap();
        assert_eq!(ids(&board, "todo"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_wip_limit_blocks_overview_drop() {
        let events = r#"[
            { "type": "down", "at_ms": 0, "x": 100, "y": 70, "card": "a" },
            { "type": "tick", "at_ms": 500 },
            { "type": "move", "at_ms": 520, "x": 300, "y": 70 },
            { "type": "tick", "at_ms": 900 },
            { "type": "move", "at_ms": 920, "x": 100, "y": 100 },
            { "type": "up", "at_ms": 940, "x": 100, "y": 100 },
            { "type": "down", "at_ms": 2000, "x": 100, "y": 70, "card": "b" },
            { "type": "tick", "at_ms": 2500 },
            { "type": "move", "at_ms": 2520, "x": 300, "y": 70 },
            { "type": "tick", "at_ms": 2900 },
            { "type": "move", "at_ms": 2920, "x": 100, "y": 100 },
            { "type": "up", "at_ms": 2940, "x": 100, "y": 100 }
        ]"#;
        let board = run(session(events, "{}")).unwrap();
        assert_eq!(ids(&board, "doing"), vec!["d", "a"]);
        assert_eq!(ids(&board, "todo"), vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_card_press_is_an_error() {
        let events = r#"[ { "type": "down", "at_ms": 0, "x": 0, "y": 0, "card": "ghost" } ]"#;
        assert!(matches!(
            run(session(events, "{}")),
            Err(ReplayError::UnknownCard { index: 0, .. })
        ));
    }
}
