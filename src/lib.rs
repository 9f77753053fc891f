//! Resource-list core of the admin dashboard.
//!
//! Every list screen (users, roles, categories, activity logs, pages) is
//! built from the same three pieces:
//!
//! - [`ResourceController`](resources::ResourceController): one paginated
//!   remote collection, its pending mutations and the row selection;
//! - [`InfiniteAccumulator`](infinite::InfiniteAccumulator): de-duplicated,
//!   filter-aware page accumulation for infinite scroll;
//! - [`WindowedGridRenderer`](grid::WindowedGridRenderer): column-track
//!   layout and direct or windowed row rendering.
//!
//! The binary serves the record proxy the controllers talk to.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::grid;
pub use modules::infinite;
pub use modules::resources;
