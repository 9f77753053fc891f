pub mod column;

pub use column::{Align, ColumnDescriptor, WidthSpec};
