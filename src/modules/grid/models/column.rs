// Column configuration for list grids.
//
// A column is declared once with its accessor key, header and layout hints;
// `GridLayout` resolves it into a grid track before any row is rendered.

use serde::{Deserialize, Serialize};

/// Width as written in a column config: a number or a CSS-ish string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidthSpec {
    Number(f64),
    Text(String),
}

impl From<f64> for WidthSpec {
    fn from(value: f64) -> Self {
        WidthSpec::Number(value)
    }
}

impl From<u32> for WidthSpec {
    fn from(value: u32) -> Self {
        WidthSpec::Number(f64::from(value))
    }
}

impl From<&str> for WidthSpec {
    fn from(value: &str) -> Self {
        WidthSpec::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Field of the row shown in this column; dots walk nested objects
    pub key: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<WidthSpec>,
    /// Size the grid computed for this column when no width is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub sortable: bool,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: None,
            size: None,
            align: Align::Left,
            hidden: false,
            sortable: false,
        }
    }

    pub fn width(mut self, width: impl Into<WidthSpec>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}
