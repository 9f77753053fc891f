pub mod http_service;
pub mod memory_service;
pub mod registry;
pub mod resource_service;

pub use http_service::HttpResourceService;
pub use memory_service::InMemoryResourceService;
pub use registry::{RecordService, ResourceRegistry};
pub use resource_service::ResourceService;
