// Scripted record store for controller and accumulator tests
//
// Pages are cut from an in-memory user list. Tests can hold a page behind a
// gate to keep its fetch in flight, script exact responses per page, shift
// page windows to produce overlapping rows, and inject failures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use resource_grid::core::{AppError, Result};
use resource_grid::resources::models::{Entity, ExportQuery, PaginatedResult, QueryState};
use resource_grid::resources::ResourceService;
use serde::Serialize;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub is_deleted: bool,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            is_deleted: false,
        }
    }
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }

    fn is_deleted(&self) -> Option<bool> {
        Some(self.is_deleted)
    }
}

#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: String,
}

/// `count` users with ids "1".."count"
pub fn users(count: usize) -> Vec<User> {
    (1..=count)
        .map(|i| User::new(i.to_string(), format!("user {:03}", i)))
        .collect()
}

pub fn ids(rows: &[User]) -> Vec<String> {
    rows.iter().map(|u| u.id.clone()).collect()
}

pub struct MockUserService {
    rows: Mutex<Vec<User>>,
    scripted: Mutex<HashMap<u32, PaginatedResult<User>>>,
    gates: Mutex<HashMap<u32, Arc<Semaphore>>>,
    overlap: AtomicUsize,
    page_calls: Mutex<Vec<QueryState>>,
    export_calls: Mutex<Vec<ExportQuery>>,
    mutation_calls: Mutex<Vec<String>>,
    failing_pages: AtomicUsize,
    failing_mutations: AtomicBool,
    hang: AtomicBool,
}

impl MockUserService {
    pub fn new(rows: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            scripted: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            overlap: AtomicUsize::new(0),
            page_calls: Mutex::new(Vec::new()),
            export_calls: Mutex::new(Vec::new()),
            mutation_calls: Mutex::new(Vec::new()),
            failing_pages: AtomicUsize::new(0),
            failing_mutations: AtomicBool::new(false),
            hang: AtomicBool::new(false),
        })
    }

    /// Answer `page` with exactly these rows, whatever the filter
    pub fn script(&self, page: u32, rows: Vec<User>, total: u64) {
        let result = PaginatedResult {
            items: rows,
            page,
            total_pages: 0,
            total,
        };
        self.scripted.lock().unwrap().insert(page, result);
    }

    /// Page N > 1 starts `overlap` rows early, repeating the end of page N - 1
    pub fn set_overlap(&self, overlap: usize) {
        self.overlap.store(overlap, Ordering::SeqCst);
    }

    /// Keep every fetch of `page` in flight until `release`
    pub fn hold(&self, page: u32) {
        self.gates
            .lock()
            .unwrap()
            .insert(page, Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, page: u32) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&page) {
            gate.close();
        }
    }

    pub fn fail_next_pages(&self, count: usize) {
        self.failing_pages.store(count, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, failing: bool) {
        self.failing_mutations.store(failing, Ordering::SeqCst);
    }

    /// Page fetches never answer
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn page_calls(&self) -> Vec<QueryState> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn page_call_count(&self) -> usize {
        self.page_calls.lock().unwrap().len()
    }

    pub fn export_calls(&self) -> Vec<ExportQuery> {
        self.export_calls.lock().unwrap().clone()
    }

    pub fn mutation_calls(&self) -> Vec<String> {
        self.mutation_calls.lock().unwrap().clone()
    }

    fn matching(&self, filter: &ExportQuery) -> Vec<User> {
        let want_deleted = filter.is_deleted.unwrap_or(false);
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_deleted == want_deleted)
            .filter(|u| match &filter.search {
                Some(needle) => u.name.contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn mutation(&self, call: String) -> Result<()> {
        self.mutation_calls.lock().unwrap().push(call);
        if self.failing_mutations.load(Ordering::SeqCst) {
            return Err(AppError::remote(422, "rejected by record store"));
        }
        Ok(())
    }

    fn set_deleted(&self, ids: &[String], deleted: bool) {
        for user in self.rows.lock().unwrap().iter_mut() {
            if ids.contains(&user.id) {
                user.is_deleted = deleted;
            }
        }
    }

    async fn wait_for_gate(&self, page: u32) {
        let gate = self.gates.lock().unwrap().get(&page).cloned();
        if let Some(gate) = gate {
            // a closed gate means released
            let _ = gate.acquire().await;
        }
    }
}

#[async_trait]
impl ResourceService<User, UserInput> for MockUserService {
    fn name(&self) -> &str {
        "users"
    }

    async fn get_page(&self, query: &QueryState) -> Result<PaginatedResult<User>> {
        self.page_calls.lock().unwrap().push(query.clone());
        self.wait_for_gate(query.page).await;

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let failing = self
            .failing_pages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::remote(503, "record store unavailable"));
        }

        if let Some(scripted) = self.scripted.lock().unwrap().get(&query.page).cloned() {
            return Ok(scripted);
        }

        let rows = self.matching(&query.export_query());
        let total = rows.len() as u64;
        let limit = query.limit as usize;
        let mut start = (query.page as usize - 1) * limit;
        if query.page > 1 {
            start = start.saturating_sub(self.overlap.load(Ordering::SeqCst));
        }
        let items = rows.into_iter().skip(start).take(limit).collect();

        Ok(PaginatedResult::new(items, query.page, query.limit, total))
    }

    async fn get_by_id(&self, id: &str) -> Result<User> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| AppError::remote(404, format!("user {} not found", id)))
    }

    async fn create(&self, input: UserInput) -> Result<User> {
        self.mutation(format!("create {}", input.name))?;
        let mut rows = self.rows.lock().unwrap();
        let user = User::new(format!("n{}", rows.len() + 1), input.name);
        rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, input: UserInput) -> Result<User> {
        self.mutation(format!("update {}", id))?;
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::remote(404, format!("user {} not found", id)))?;
        user.name = input.name;
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.mutation(format!("delete {}", id))?;
        self.set_deleted(&[id.to_string()], true);
        Ok(())
    }

    async fn restore(&self, id: &str) -> Result<()> {
        self.mutation(format!("restore {}", id))?;
        self.set_deleted(&[id.to_string()], false);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        self.mutation(format!("delete_many {}", ids.join(",")))?;
        self.set_deleted(ids, true);
        Ok(())
    }

    async fn restore_many(&self, ids: &[String]) -> Result<()> {
        self.mutation(format!("restore_many {}", ids.join(",")))?;
        self.set_deleted(ids, false);
        Ok(())
    }

    async fn batch_update_status(&self, ids: &[String], is_active: bool) -> Result<()> {
        self.mutation(format!("status {} {}", ids.join(","), is_active))?;
        for user in self.rows.lock().unwrap().iter_mut() {
            if ids.contains(&user.id) {
                user.is_active = is_active;
            }
        }
        Ok(())
    }

    async fn get_all_for_export(&self, query: &ExportQuery) -> Result<Vec<User>> {
        self.export_calls.lock().unwrap().push(query.clone());
        Ok(self.matching(query))
    }
}
