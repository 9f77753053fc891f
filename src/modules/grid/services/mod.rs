pub mod renderer;
pub mod track_layout;

pub use renderer::{
    visible_range, GridOptions, HeaderCell, RenderMode, RenderPlan, RenderedCell, RenderedRow,
    RowsPlan, ViewState, WindowedGridRenderer, DEFAULT_VIRTUALIZE_THRESHOLD,
};
pub use track_layout::{
    resolve_track, GridLayout, ResolvedColumn, Track, DEFAULT_COLUMN_SIZE, FLEX_WEIGHT_MAX,
};
