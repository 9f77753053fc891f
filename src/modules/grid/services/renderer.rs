//! Row rendering for list grids.
//!
//! Small row sets are rendered directly. Above the configured threshold the
//! renderer switches to windowing: rows have a fixed height and only those
//! intersecting the viewport (plus overscan) are materialized. Rows are
//! keyed by entity id, never by position.

use std::collections::BTreeSet;
use std::ops::Range;

use serde::Serialize;
use serde_json::Value;

use super::track_layout::{GridLayout, ResolvedColumn};
use crate::config::GridConfig;
use crate::modules::grid::models::{Align, ColumnDescriptor};
use crate::modules::resources::models::Entity;

/// Row count above which rendering switches to windowing
pub const DEFAULT_VIRTUALIZE_THRESHOLD: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    pub virtualize_threshold: usize,
    /// Fixed row height in pixels, used for windowing
    pub row_height: u32,
    pub viewport_height: u32,
    /// Extra rows materialized above and below the viewport
    pub overscan: usize,
    pub skeleton_rows: usize,
    pub selectable: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            virtualize_threshold: DEFAULT_VIRTUALIZE_THRESHOLD,
            row_height: 52,
            viewport_height: 600,
            overscan: 5,
            skeleton_rows: 5,
            selectable: true,
        }
    }
}

impl From<&GridConfig> for GridOptions {
    fn from(config: &GridConfig) -> Self {
        Self {
            virtualize_threshold: config.virtualize_threshold,
            row_height: config.row_height,
            viewport_height: config.viewport_height,
            overscan: config.overscan,
            skeleton_rows: config.skeleton_rows,
            selectable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Direct,
    Windowed,
}

/// Per-render inputs owned by the screen and the controller
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub loading: bool,
    pub selected: &'a BTreeSet<String>,
    /// Vertical scroll position of the grid body, in pixels
    pub scroll_offset: u32,
    pub empty_message: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub align: Align,
    pub sortable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    pub text: String,
    pub align: Align,
}

#[derive(Debug, Clone)]
pub struct RenderedRow<'a, T> {
    pub key: &'a str,
    pub index: usize,
    /// Offset from the top of the grid body, in pixels
    pub top: u64,
    pub selected: bool,
    pub cells: Vec<RenderedCell>,
    pub row: &'a T,
}

#[derive(Debug, Clone)]
pub struct RowsPlan<'a, T> {
    pub mode: RenderMode,
    pub template: String,
    pub header: Vec<HeaderCell>,
    pub rows: Vec<RenderedRow<'a, T>>,
    pub row_count: usize,
    /// Scrollable body height; every row counts, materialized or not
    pub total_height: u64,
}

#[derive(Debug, Clone)]
pub enum RenderPlan<'a, T> {
    /// Placeholder rows shown while loading, same columns as the real grid
    Skeleton {
        rows: usize,
        columns: usize,
        template: String,
    },
    Empty {
        message: String,
        template: String,
    },
    Rows(RowsPlan<'a, T>),
}

/// Rows of `row_count` fixed-height rows that intersect the viewport, with overscan
pub fn visible_range(
    row_count: usize,
    row_height: u32,
    viewport_height: u32,
    scroll_offset: u32,
    overscan: usize,
) -> Range<usize> {
    if row_count == 0 || row_height == 0 {
        return 0..0;
    }

    let row_height = u64::from(row_height);
    let content_height = row_count as u64 * row_height;
    let max_offset = content_height.saturating_sub(u64::from(viewport_height));
    let offset = u64::from(scroll_offset).min(max_offset);

    let first = (offset / row_height) as usize;
    let visible = u64::from(viewport_height).div_ceil(row_height).max(1) as usize;

    let start = first.saturating_sub(overscan);
    let end = first
        .saturating_add(visible)
        .saturating_add(overscan)
        .min(row_count);
    start.min(end)..end
}

pub struct WindowedGridRenderer {
    layout: GridLayout,
    options: GridOptions,
}

impl WindowedGridRenderer {
    pub fn new(columns: &[ColumnDescriptor], options: GridOptions) -> Self {
        Self {
            layout: GridLayout::new(columns, options.selectable),
            options,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn mode_for(&self, row_count: usize) -> RenderMode {
        if row_count > self.options.virtualize_threshold {
            RenderMode::Windowed
        } else {
            RenderMode::Direct
        }
    }

    pub fn render<'a, T>(&self, rows: &'a [T], view: ViewState<'_>) -> RenderPlan<'a, T>
    where
        T: Entity + Serialize,
    {
        let template = self.layout.template().to_string();

        if view.loading {
            return RenderPlan::Skeleton {
                rows: self.options.skeleton_rows,
                columns: self.layout.len(),
                template,
            };
        }

        if rows.is_empty() {
            return RenderPlan::Empty {
                message: view.empty_message.to_string(),
                template,
            };
        }

        let mode = self.mode_for(rows.len());
        let range = match mode {
            RenderMode::Direct => 0..rows.len(),
            RenderMode::Windowed => visible_range(
                rows.len(),
                self.options.row_height,
                self.options.viewport_height,
                view.scroll_offset,
                self.options.overscan,
            ),
        };

        let row_height = u64::from(self.options.row_height);
        let materialized = rows[range.clone()]
            .iter()
            .zip(range)
            .map(|(row, index)| RenderedRow {
                key: row.id(),
                index,
                top: index as u64 * row_height,
                selected: view.selected.contains(row.id()),
                cells: self.cells(row),
                row,
            })
            .collect();

        RenderPlan::Rows(RowsPlan {
            mode,
            template,
            header: self.header(),
            rows: materialized,
            row_count: rows.len(),
            total_height: rows.len() as u64 * row_height,
        })
    }

    fn header(&self) -> Vec<HeaderCell> {
        self.layout
            .columns()
            .iter()
            .map(|c| HeaderCell {
                key: c.key.clone(),
                label: c.header.clone(),
                align: c.align,
                sortable: c.sortable,
            })
            .collect()
    }

    fn cells<T: Serialize>(&self, row: &T) -> Vec<RenderedCell> {
        let value = match serde_json::to_value(row) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Row is not serializable, rendering blank cells");
                Value::Null
            }
        };

        self.layout
            .columns()
            .iter()
            .map(|column| RenderedCell {
                text: cell_text(&value, column),
                align: column.align,
            })
            .collect()
    }
}

fn cell_text(row: &Value, column: &ResolvedColumn) -> String {
    let found = column
        .key
        .split('.')
        .try_fold(row, |value, segment| value.get(segment));

    match found {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
