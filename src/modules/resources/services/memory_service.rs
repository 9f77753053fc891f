// In-memory record store.
//
// Stands in for the hosted record store when no upstream is configured:
// server-assigned ids, soft delete, substring search, single-field sort.

use std::cmp::Ordering;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::resource_service::ResourceService;
use crate::core::{AppError, Result};
use crate::modules::resources::models::{
    Entity, ExportQuery, PaginatedResult, QueryState, Record, SortOrder,
};

pub struct InMemoryResourceService {
    name: String,
    records: RwLock<Vec<Record>>,
}

impl InMemoryResourceService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn with_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Record>>> {
        self.records
            .read()
            .map_err(|_| AppError::internal("record store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Record>>> {
        self.records
            .write()
            .map_err(|_| AppError::internal("record store lock poisoned"))
    }

    /// Rows matching the filter, sorted
    fn select(&self, filter: &ExportQuery) -> Result<Vec<Record>> {
        let want_deleted = filter.is_deleted.unwrap_or(false);
        let mut rows: Vec<Record> = self
            .read()?
            .iter()
            .filter(|r| r.is_deleted().unwrap_or(false) == want_deleted)
            .filter(|r| match &filter.search {
                Some(needle) => r.matches_search(needle),
                None => true,
            })
            .cloned()
            .collect();

        if let Some(field) = &filter.sort {
            let order = filter.order.unwrap_or(SortOrder::Asc);
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.field(field).as_ref(), b.field(field).as_ref());
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        Ok(rows)
    }

    fn set_flag_on(&self, ids: &[String], flag: &str, value: bool) -> Result<()> {
        let mut records = self.write()?;

        if let Some(missing) = ids.iter().find(|id| !records.iter().any(|r| &r.id == *id)) {
            return Err(AppError::not_found(format!("{} {}", self.name, missing)));
        }

        let now = Utc::now().to_rfc3339();
        for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
            record.set_flag(flag, value);
            record
                .fields
                .insert("updatedAt".to_string(), Value::String(now.clone()));
        }
        Ok(())
    }
}

/// Missing and null sort after every present value
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl ResourceService<Record, Value> for InMemoryResourceService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_page(&self, query: &QueryState) -> Result<PaginatedResult<Record>> {
        if query.page == 0 || query.limit == 0 {
            return Err(AppError::validation("page and limit must be positive"));
        }

        let rows = self.select(&query.export_query())?;
        let total = rows.len() as u64;
        let start = (query.page as usize - 1).saturating_mul(query.limit as usize);
        let items: Vec<Record> = rows
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .collect();

        Ok(PaginatedResult::new(items, query.page, query.limit, total))
    }

    async fn get_by_id(&self, id: &str) -> Result<Record> {
        self.read()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("{} {}", self.name, id)))
    }

    async fn create(&self, input: Value) -> Result<Record> {
        let mut record = Record::from_input(Uuid::new_v4().to_string(), input)?;
        let now = Utc::now().to_rfc3339();
        record
            .fields
            .insert("createdAt".to_string(), Value::String(now.clone()));
        record
            .fields
            .insert("updatedAt".to_string(), Value::String(now));

        self.write()?.push(record.clone());
        tracing::debug!(resource = %self.name, id = %record.id, "Record created");
        Ok(record)
    }

    async fn update(&self, id: &str, input: Value) -> Result<Record> {
        let mut records = self.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("{} {}", self.name, id)))?;

        record.apply(input)?;
        record.fields.insert(
            "updatedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.set_flag_on(&[id.to_string()], "isDeleted", true)
    }

    async fn restore(&self, id: &str) -> Result<()> {
        self.set_flag_on(&[id.to_string()], "isDeleted", false)
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        self.set_flag_on(ids, "isDeleted", true)
    }

    async fn restore_many(&self, ids: &[String]) -> Result<()> {
        self.set_flag_on(ids, "isDeleted", false)
    }

    async fn batch_update_status(&self, ids: &[String], is_active: bool) -> Result<()> {
        self.set_flag_on(ids, "isActive", is_active)
    }

    async fn get_all_for_export(&self, query: &ExportQuery) -> Result<Vec<Record>> {
        self.select(query)
    }
}
