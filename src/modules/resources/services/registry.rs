use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::resource_service::ResourceService;
use crate::core::{AppError, Result};
use crate::modules::resources::models::Record;

pub type RecordService = Arc<dyn ResourceService<Record, Value>>;

/// Record services behind the proxy, keyed by resource name
pub struct ResourceRegistry {
    services: HashMap<String, RecordService>,
    default_limit: u32,
}

impl ResourceRegistry {
    pub fn new(default_limit: u32) -> Self {
        Self {
            services: HashMap::new(),
            default_limit: default_limit.max(1),
        }
    }

    /// Register a service under its own name
    pub fn register(&mut self, service: RecordService) {
        let name = service.name().to_string();
        tracing::info!(resource = %name, "Registered resource");
        self.services.insert(name, service);
    }

    pub fn get(&self, resource: &str) -> Result<RecordService> {
        self.services
            .get(resource)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Resource '{}'", resource)))
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }
}
