//! Grid layout standing in for a rendering layer.
//!
//! Columns sit side by side, cards stack below a column header. The replay
//! re-reports every rectangle to the engine after each event, the way a UI
//! reports layout as it settles.

use cardflow_core::{Board, BoardEngine, BoardItem, ColumnId};
use kurbo::{Affine, Rect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub column_width: f64,
    pub column_gap: f64,
    pub column_height: f64,
    pub header_height: f64,
    pub card_height: f64,
    pub card_gap: f64,
    /// Scale of the miniature columns shown in the overview.
    pub overview_scale: f64,
    /// Visible area used for edge auto-scrolling.
    pub viewport: Option<Rect>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            column_width: 280.0,
            column_gap: 16.0,
            column_height: 800.0,
            header_height: 40.0,
            card_height: 60.0,
            card_gap: 8.0,
            overview_scale: 0.25,
            viewport: None,
        }
    }
}

impl GridLayout {
    pub fn column_rect(&self, index: usize) -> Rect {
        let x0 = index as f64 * (self.column_width + self.column_gap);
        Rect::new(x0, 0.0, x0 + self.column_width, self.column_height)
    }

    pub fn card_rect(&self, column_index: usize, index: usize) -> Rect {
        let column = self.column_rect(column_index);
        let y0 = self.header_height + index as f64 * (self.card_height + self.card_gap);
        Rect::new(column.x0, y0, column.x1, y0 + self.card_height)
    }

    /// Replace every registered rectangle with the layout of the current board.
    pub fn report<T: BoardItem>(&self, engine: &mut BoardEngine<T>) {
        let board = engine.board();
        let registry = engine.registry_mut();
        registry.clear();
        for (ci, column) in board.columns.iter().enumerate() {
            registry.register_column(column.id.clone(), ci, self.column_rect(ci));
            for (i, item) in column.items.iter().enumerate() {
                registry.register_card(
                    item.id().clone(),
                    column.id.clone(),
                    i,
                    self.card_rect(ci, i),
                );
            }
        }
    }

    /// Miniature column rectangles of the overview.
    pub fn overview_columns<T: BoardItem>(&self, board: &Board<T>) -> Vec<(ColumnId, Rect)> {
        let scale = Affine::scale(self.overview_scale);
        board
            .columns
            .iter()
            .enumerate()
            .map(|(ci, column)| {
                let rect = scale.transform_rect_bbox(self.column_rect(ci));
                (column.id.clone(), rect)
            })
            .collect()
    }
}
