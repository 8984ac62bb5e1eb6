use super::{message, view};
use crate::models::{Named, PostForm, PostStatus, Upload, UserSummary};
use crate::services::bulk::{self, BulkReport};
use crate::services::dashboard::{load_dashboard, Dashboard};
use crate::services::pagination::Page;
use crate::services::presenter::{PostDetail, PostResource};
use crate::services::query::{query_posts, PostFilter, PostFilterParams};
use crate::services::{auth, categories, posts, tags, ServiceError};
use crate::web::error::{AppResult, HttpError};
use crate::web::extractors::AdminContext;
use crate::web::state::AppState;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const STATUSES: [PostStatus; 2] = [PostStatus::Published, PostStatus::Draft];

#[derive(Serialize)]
struct DashboardProps {
    user: UserSummary,
    #[serde(flatten)]
    dashboard: Dashboard,
}

pub async fn dashboard(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response> {
    let dashboard = load_dashboard(&state.db, &state.presenter)?;
    Ok(view(
        "Dashboard",
        DashboardProps {
            user: UserSummary::from(&admin.user),
            dashboard,
        },
    )
    .into_response())
}

#[derive(Serialize)]
struct PostIndexProps {
    posts: Page<PostResource>,
    categories: Vec<Named>,
    tags: Vec<Named>,
    filters: PostFilter,
}

pub async fn posts(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostFilterParams>,
) -> AppResult<Response> {
    let content = &state.config.content;
    let filter = PostFilter::from_params(&params, content.admin_per_page, content.max_per_page);
    let page = query_posts(&state.db, &filter)?;

    Ok(view(
        "Posts/Index",
        PostIndexProps {
            posts: page.map(|item| state.presenter.resource(&item)),
            categories: categories::list_category_names(&state.db)?,
            tags: tags::list_tag_names(&state.db)?,
            filters: filter,
        },
    )
    .into_response())
}

#[derive(Serialize)]
struct PostFormProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<PostDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_ids: Option<Vec<i64>>,
    categories: Vec<Named>,
    tags: Vec<Named>,
    statuses: [PostStatus; 2],
}

pub async fn create_post_form(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response> {
    Ok(view(
        "Posts/Create",
        PostFormProps {
            post: None,
            tag_ids: None,
            categories: categories::list_category_names(&state.db)?,
            tags: tags::list_tag_names(&state.db)?,
            statuses: STATUSES,
        },
    )
    .into_response())
}

pub async fn edit_post(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let item = posts::get_post_with_relations(&state.db, id)?
        .ok_or(ServiceError::NotFound("post"))?;

    Ok(view(
        "Posts/Edit",
        PostFormProps {
            post: Some(state.presenter.detail(&item)),
            tag_ids: Some(item.tags.iter().map(|t| t.id).collect()),
            categories: categories::list_category_names(&state.db)?,
            tags: tags::list_tag_names(&state.db)?,
            statuses: STATUSES,
        },
    )
    .into_response())
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "on" | "yes")
}

/// Reads the post form out of a multipart body.
///
/// Unknown fields are drained and ignored. An empty file part counts as no
/// upload.
async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, MultipartError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "thumbnail" => {
                let data = field.bytes().await?.to_vec();
                if !data.is_empty() {
                    form.thumbnail = Some(Upload { data });
                }
            }
            "title" => form.title = Some(field.text().await?),
            "content" => form.content = Some(field.text().await?),
            "status" => form.status = Some(field.text().await?),
            "category_id" => form.category_id = Some(field.text().await?),
            "tags" | "tags[]" => form.tags.push(field.text().await?),
            "remove_thumbnail" => form.remove_thumbnail = is_truthy(&field.text().await?),
            _ => {
                field.bytes().await?;
            }
        }
    }

    Ok(form)
}

async fn post_form(multipart: Multipart) -> Result<PostForm, HttpError> {
    read_post_form(multipart)
        .await
        .map_err(|e| HttpError::new(e.status(), e.body_text()))
}

#[derive(Serialize)]
struct SavedPost {
    post: PostDetail,
}

fn saved_post(state: &AppState, id: i64) -> AppResult<SavedPost> {
    let item = posts::get_post_with_relations(&state.db, id)?
        .ok_or(ServiceError::NotFound("post"))?;
    Ok(SavedPost {
        post: state.presenter.detail(&item),
    })
}

pub async fn create_post(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = post_form(multipart).await?;
    let post = posts::create_post(
        &state.db,
        &state.thumbnails,
        &form,
        state.config.media.max_thumbnail_bytes(),
    )?;

    let body = saved_post(&state, post.id)?;
    Ok((StatusCode::CREATED, message("Post created successfully.", body)).into_response())
}

pub async fn update_post(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = post_form(multipart).await?;
    let post = posts::update_post(
        &state.db,
        &state.thumbnails,
        id,
        &form,
        state.config.media.max_thumbnail_bytes(),
    )?;

    let body = saved_post(&state, post.id)?;
    Ok(message("Post updated successfully.", body).into_response())
}

pub async fn delete_post(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if !posts::delete_post(&state.db, &state.thumbnails, id)? {
        return Err(ServiceError::NotFound("post").into());
    }
    Ok(message("Post deleted successfully.", serde_json::json!({ "id": id })).into_response())
}

/// Response of every bulk-delete endpoint.
pub(crate) fn bulk_response(report: BulkReport, plural: &str) -> Response {
    let text = if report.failed() == 0 {
        format!("{} {} deleted successfully.", report.deleted, plural)
    } else {
        format!(
            "{} {} deleted, {} failed.",
            report.deleted,
            plural,
            report.failed()
        )
    };
    message(text, report).into_response()
}

pub async fn bulk_delete_posts(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> AppResult<Response> {
    let ids = bulk::selection(body.as_ref().map(|Json(v)| v), "posts")?;
    let report = posts::bulk_delete_posts(&state.db, &state.thumbnails, &ids);
    Ok(bulk_response(report, "posts"))
}

#[derive(Serialize)]
struct Toggled {
    id: i64,
    status: PostStatus,
}

pub async fn toggle_post_status(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let status = posts::toggle_status(&state.db, id)?;
    Ok(message(format!("Post marked as {}.", status), Toggled { id, status }).into_response())
}

#[derive(Serialize)]
struct ProfileProps {
    user: UserSummary,
}

pub async fn profile(admin: AdminContext) -> Response {
    view(
        "Profile/Edit",
        ProfileProps {
            user: UserSummary::from(&admin.user),
        },
    )
    .into_response()
}

#[derive(Deserialize, Default)]
pub struct ProfileForm {
    name: Option<String>,
}

pub async fn update_profile(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    body: Option<Json<ProfileForm>>,
) -> AppResult<Response> {
    let form = body.map(|Json(f)| f).unwrap_or_default();
    let user = auth::update_profile_name(&state.db, admin.user.id, form.name.as_deref())?;
    Ok(message(
        "Profile updated successfully.",
        ProfileProps {
            user: UserSummary::from(&user),
        },
    )
    .into_response())
}
