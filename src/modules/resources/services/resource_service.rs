use async_trait::async_trait;

use crate::core::Result;
use crate::modules::resources::models::{ExportQuery, PaginatedResult, QueryState};

/// Remote record-access contract for one resource type
///
/// `T` is the entity read back from the store, `I` the create/update payload.
#[async_trait]
pub trait ResourceService<T, I>: Send + Sync {
    /// Resource name, used in logs and notifications
    fn name(&self) -> &str;

    /// Fetch one window of the rows matching `query`
    async fn get_page(&self, query: &QueryState) -> Result<PaginatedResult<T>>;

    async fn get_by_id(&self, id: &str) -> Result<T>;

    async fn create(&self, input: I) -> Result<T>;

    async fn update(&self, id: &str, input: I) -> Result<T>;

    /// Soft delete
    async fn delete(&self, id: &str) -> Result<()>;

    async fn restore(&self, id: &str) -> Result<()>;

    async fn delete_many(&self, ids: &[String]) -> Result<()>;

    async fn restore_many(&self, ids: &[String]) -> Result<()>;

    async fn batch_update_status(&self, ids: &[String], is_active: bool) -> Result<()>;

    /// Every row matching the filter, ignoring page and limit
    async fn get_all_for_export(&self, query: &ExportQuery) -> Result<Vec<T>>;
}
