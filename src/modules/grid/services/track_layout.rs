// Column-track resolution.
//
// Precedence for one column:
//   1. string width with a unit or percentage -> verbatim
//   2. string width that is a plain number    -> pixels
//   3. numeric width <= FLEX_WEIGHT_MAX        -> flexible weight (Nfr)
//   4. numeric width >  FLEX_WEIGHT_MAX        -> pixels
//   5. no width -> computed size; the default size becomes minmax(150px, 1fr)
//
// FLEX_WEIGHT_MAX is a compatibility constant for existing column configs.
// It is not derived from anything; do not tune it.

use std::fmt;

use crate::modules::grid::models::{Align, ColumnDescriptor, WidthSpec};

/// Numeric widths up to and including this value are flex weights, not pixels
pub const FLEX_WEIGHT_MAX: f64 = 10.0;

/// Size a column gets when nothing else is known about it
pub const DEFAULT_COLUMN_SIZE: u32 = 150;

/// Track used for the row-selection checkbox column
pub const SELECTION_TRACK_PX: u32 = 48;

/// One entry of a grid-template-columns value
#[derive(Debug, Clone, PartialEq)]
pub enum Track {
    Verbatim(String),
    Px(f64),
    Fr(f64),
    /// Default-sized column that may grow: `minmax({min_px}px, 1fr)`
    Growable { min_px: u32 },
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Verbatim(value) => f.write_str(value),
            Track::Px(px) => write!(f, "{}px", px),
            Track::Fr(weight) => write!(f, "{}fr", weight),
            Track::Growable { min_px } => write!(f, "minmax({}px, 1fr)", min_px),
        }
    }
}

/// Resolve one column's track from its configured width and computed size
pub fn resolve_track(width: Option<&WidthSpec>, computed_size: u32) -> Track {
    match width {
        Some(WidthSpec::Text(text)) if !text.trim().is_empty() => {
            let text = text.trim();
            match text.parse::<f64>() {
                Ok(px) if px.is_finite() => Track::Px(px),
                _ => Track::Verbatim(text.to_string()),
            }
        }
        Some(WidthSpec::Number(n)) if *n <= FLEX_WEIGHT_MAX => Track::Fr(*n),
        Some(WidthSpec::Number(n)) => Track::Px(*n),
        _ if computed_size == DEFAULT_COLUMN_SIZE => Track::Growable {
            min_px: DEFAULT_COLUMN_SIZE,
        },
        _ => Track::Px(f64::from(computed_size)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub key: String,
    pub header: String,
    pub track: Track,
    pub align: Align,
    pub sortable: bool,
}

impl ResolvedColumn {
    pub fn resolve(column: &ColumnDescriptor) -> Self {
        let computed = column.size.unwrap_or(DEFAULT_COLUMN_SIZE);
        Self {
            key: column.key.clone(),
            header: column.header.clone(),
            track: resolve_track(column.width.as_ref(), computed),
            align: column.align,
            sortable: column.sortable,
        }
    }
}

/// Visible columns with their tracks, resolved once per column config
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    columns: Vec<ResolvedColumn>,
    selectable: bool,
    template: String,
}

impl GridLayout {
    pub fn new(columns: &[ColumnDescriptor], selectable: bool) -> Self {
        let columns: Vec<ResolvedColumn> = columns
            .iter()
            .filter(|c| !c.hidden)
            .map(ResolvedColumn::resolve)
            .collect();

        let mut tracks: Vec<String> = Vec::with_capacity(columns.len() + 1);
        if selectable {
            tracks.push(Track::Px(f64::from(SELECTION_TRACK_PX)).to_string());
        }
        tracks.extend(columns.iter().map(|c| c.track.to_string()));

        Self {
            columns,
            selectable,
            template: tracks.join(" "),
        }
    }

    /// Value for `grid-template-columns`
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Visible data columns (selection column excluded)
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
