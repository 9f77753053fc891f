use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::AppError;
use crate::modules::resources::models::{ExportQuery, QueryState, SortOrder, FIRST_PAGE};
use crate::modules::resources::services::ResourceRegistry;

/// Query parameters accepted by the list and export routes
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub search: Option<String>,
    pub is_deleted: Option<bool>,
}

impl ListQuery {
    fn into_query_state(self, default_limit: u32) -> Result<QueryState, AppError> {
        let page = self.page.unwrap_or(FIRST_PAGE);
        let limit = self.limit.unwrap_or(default_limit);
        if page == 0 || limit == 0 {
            return Err(AppError::validation("page and limit must be positive"));
        }

        Ok(QueryState {
            page,
            limit,
            sort: self.sort,
            order: self.order,
            search: self.search.filter(|s| !s.trim().is_empty()),
            is_deleted: self.is_deleted,
        })
    }

    fn into_export_query(self) -> ExportQuery {
        ExportQuery {
            sort: self.sort,
            order: self.order,
            search: self.search.filter(|s| !s.trim().is_empty()),
            is_deleted: self.is_deleted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub ids: Vec<String>,
    pub is_active: bool,
}

/// GET /api/{resource}
pub async fn list_records(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let service = registry.get(&path.into_inner())?;
    let query = query.into_inner().into_query_state(registry.default_limit())?;
    let page = service.get_page(&query).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/{resource}/export
pub async fn export_records(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let service = registry.get(&path.into_inner())?;
    let rows = service
        .get_all_for_export(&query.into_inner().into_export_query())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/{resource}/{id}
pub async fn get_record(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (resource, id) = path.into_inner();
    let record = registry.get(&resource)?.get_by_id(&id).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// POST /api/{resource}
pub async fn create_record(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let record = registry
        .get(&path.into_inner())?
        .create(body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(record))
}

/// PUT /api/{resource}/{id}
pub async fn update_record(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let (resource, id) = path.into_inner();
    let record = registry
        .get(&resource)?
        .update(&id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// DELETE /api/{resource}/{id}
pub async fn delete_record(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (resource, id) = path.into_inner();
    registry.get(&resource)?.delete(&id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/{resource}/{id}/restore
pub async fn restore_record(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (resource, id) = path.into_inner();
    registry.get(&resource)?.restore(&id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/{resource}/batch/delete
pub async fn batch_delete(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<String>,
    body: web::Json<IdsRequest>,
) -> Result<HttpResponse, AppError> {
    let ids = non_empty(body.into_inner().ids)?;
    registry.get(&path.into_inner())?.delete_many(&ids).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/{resource}/batch/restore
pub async fn batch_restore(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<String>,
    body: web::Json<IdsRequest>,
) -> Result<HttpResponse, AppError> {
    let ids = non_empty(body.into_inner().ids)?;
    registry.get(&path.into_inner())?.restore_many(&ids).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/{resource}/batch/status
pub async fn batch_status(
    registry: web::Data<ResourceRegistry>,
    path: web::Path<String>,
    body: web::Json<StatusRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let ids = non_empty(request.ids)?;
    registry
        .get(&path.into_inner())?
        .batch_update_status(&ids, request.is_active)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

fn non_empty(ids: Vec<String>) -> Result<Vec<String>, AppError> {
    if ids.is_empty() {
        return Err(AppError::validation("ids must not be empty"));
    }
    Ok(ids)
}

/// Configure record proxy routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/{resource}")
            .route("", web::get().to(list_records))
            .route("", web::post().to(create_record))
            .route("/export", web::get().to(export_records))
            .route("/batch/delete", web::post().to(batch_delete))
            .route("/batch/restore", web::post().to(batch_restore))
            .route("/batch/status", web::post().to(batch_status))
            .route("/{id}", web::get().to(get_record))
            .route("/{id}", web::put().to(update_record))
            .route("/{id}", web::delete().to(delete_record))
            .route("/{id}/restore", web::post().to(restore_record)),
    );
}
