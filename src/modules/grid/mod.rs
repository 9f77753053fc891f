// List grid: column tracks and windowed row rendering

pub mod models;
pub mod services;

pub use models::{Align, ColumnDescriptor, WidthSpec};
pub use services::{
    resolve_track, visible_range, GridLayout, GridOptions, HeaderCell, RenderMode, RenderPlan,
    RenderedRow, RowsPlan, Track, ViewState, WindowedGridRenderer, DEFAULT_COLUMN_SIZE,
    DEFAULT_VIRTUALIZE_THRESHOLD, FLEX_WEIGHT_MAX,
};
