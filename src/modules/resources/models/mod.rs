pub mod entity;
pub mod paginated;
pub mod query;
pub mod record;

pub use entity::Entity;
pub use paginated::PaginatedResult;
pub use query::{
    page_count, ExportQuery, FilterSignature, QueryPatch, QueryState, SortOrder, FIRST_PAGE,
};
pub use record::Record;
