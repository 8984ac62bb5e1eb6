//! Admin screens for categories and tags. Both are name-only records with
//! identical workflows, so each handler here has a category and a tag twin.

use super::admin::bulk_response;
use super::{message, view};
use crate::models::{Category, CategoryWithCount, Tag, TagWithCount, TermForm};
use crate::services::bulk;
use crate::services::pagination::{Page, PageRequest};
use crate::services::{categories, tags, ServiceError};
use crate::web::error::AppResult;
use crate::web::extractors::AdminContext;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct TermListParams {
    pub search: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
}

#[derive(Serialize)]
struct TermFilters {
    search: Option<String>,
    per_page: i64,
    page: i64,
}

impl TermListParams {
    fn paging(&self, state: &AppState) -> PageRequest {
        PageRequest::parse(
            self.page.as_deref(),
            self.per_page.as_deref(),
            state.config.content.admin_per_page,
            state.config.content.max_per_page,
        )
    }

    fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn filters(&self, paging: PageRequest) -> TermFilters {
        TermFilters {
            search: self.search().map(String::from),
            per_page: paging.per_page,
            page: paging.page,
        }
    }
}

fn form_of(body: Option<Json<TermForm>>) -> TermForm {
    body.map(|Json(form)| form).unwrap_or_default()
}

#[derive(Serialize)]
struct CategoryIndexProps {
    categories: Page<CategoryWithCount>,
    filters: TermFilters,
}

pub async fn categories(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermListParams>,
) -> AppResult<Response> {
    let paging = params.paging(&state);
    let page = categories::list_categories(&state.db, params.search(), paging)?;
    Ok(view(
        "Categories/Index",
        CategoryIndexProps {
            categories: page,
            filters: params.filters(paging),
        },
    )
    .into_response())
}

pub async fn create_category_form(_admin: AdminContext) -> Response {
    view("Categories/Create", json!({})).into_response()
}

#[derive(Serialize)]
struct CategoryProps {
    category: Category,
}

fn category_props(state: &AppState, id: i64) -> AppResult<CategoryProps> {
    let category = categories::get_category(&state.db, id)?
        .ok_or(ServiceError::NotFound("category"))?;
    Ok(CategoryProps { category })
}

pub async fn store_category(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    body: Option<Json<TermForm>>,
) -> AppResult<Response> {
    let id = categories::create_category(&state.db, &form_of(body))?;
    let props = category_props(&state, id)?;
    Ok((StatusCode::CREATED, message("Category created successfully.", props)).into_response())
}

pub async fn edit_category(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    Ok(view("Categories/Edit", category_props(&state, id)?).into_response())
}

pub async fn update_category(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<TermForm>>,
) -> AppResult<Response> {
    categories::update_category(&state.db, id, &form_of(body))?;
    let props = category_props(&state, id)?;
    Ok(message("Category updated successfully.", props).into_response())
}

pub async fn delete_category(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if !categories::delete_category(&state.db, id)? {
        return Err(ServiceError::NotFound("category").into());
    }
    Ok(message("Category deleted successfully.", json!({ "id": id })).into_response())
}

pub async fn bulk_delete_categories(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> AppResult<Response> {
    let ids = bulk::selection(body.as_ref().map(|Json(v)| v), "categories")?;
    let report = categories::bulk_delete_categories(&state.db, &ids);
    Ok(bulk_response(report, "categories"))
}

#[derive(Serialize)]
struct TagIndexProps {
    tags: Page<TagWithCount>,
    filters: TermFilters,
}

pub async fn tags(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermListParams>,
) -> AppResult<Response> {
    let paging = params.paging(&state);
    let page = tags::list_tags(&state.db, params.search(), paging)?;
    Ok(view(
        "Tags/Index",
        TagIndexProps {
            tags: page,
            filters: params.filters(paging),
        },
    )
    .into_response())
}

pub async fn create_tag_form(_admin: AdminContext) -> Response {
    view("Tags/Create", json!({})).into_response()
}

#[derive(Serialize)]
struct TagProps {
    tag: Tag,
}

fn tag_props(state: &AppState, id: i64) -> AppResult<TagProps> {
    let tag = tags::get_tag(&state.db, id)?.ok_or(ServiceError::NotFound("tag"))?;
    Ok(TagProps { tag })
}

pub async fn store_tag(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    body: Option<Json<TermForm>>,
) -> AppResult<Response> {
    let id = tags::create_tag(&state.db, &form_of(body))?;
    let props = tag_props(&state, id)?;
    Ok((StatusCode::CREATED, message("Tag created successfully.", props)).into_response())
}

pub async fn edit_tag(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    Ok(view("Tags/Edit", tag_props(&state, id)?).into_response())
}

pub async fn update_tag(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<TermForm>>,
) -> AppResult<Response> {
    tags::update_tag(&state.db, id, &form_of(body))?;
    let props = tag_props(&state, id)?;
    Ok(message("Tag updated successfully.", props).into_response())
}

pub async fn delete_tag(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if !tags::delete_tag(&state.db, id)? {
        return Err(ServiceError::NotFound("tag").into());
    }
    Ok(message("Tag deleted successfully.", json!({ "id": id })).into_response())
}

pub async fn bulk_delete_tags(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> AppResult<Response> {
    let ids = bulk::selection(body.as_ref().map(|Json(v)| v), "tags")?;
    let report = tags::bulk_delete_tags(&state.db, &ids);
    Ok(bulk_response(report, "tags"))
}
