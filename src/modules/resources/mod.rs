// Paginated remote collections: query model, record-store clients,
// the list controller and the record proxy routes.

pub mod controllers;
pub mod models;
pub mod services;

pub use controllers::{ControllerEvent, ControllerSnapshot, ResourceController};
pub use models::{Entity, PaginatedResult, QueryPatch, QueryState, Record, SortOrder};
pub use services::{HttpResourceService, InMemoryResourceService, ResourceService};
