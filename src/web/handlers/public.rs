use super::view;
use crate::services::pagination::Page;
use crate::services::posts::{get_published_by_slug, latest_posts, related_posts};
use crate::services::presenter::{PostCard, PostDetail, PostResource};
use crate::services::query::{query_posts, PostFilter};
use crate::services::ServiceError;
use crate::web::error::AppResult;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize)]
struct SiteInfo<'a> {
    title: &'a str,
    description: &'a str,
    url: &'a str,
}

fn site_info(state: &AppState) -> SiteInfo<'_> {
    let site = &state.config.site;
    SiteInfo {
        title: &site.title,
        description: &site.description,
        url: &site.url,
    }
}

#[derive(Serialize)]
struct HomeProps<'a> {
    site: SiteInfo<'a>,
    posts: Vec<PostResource>,
}

pub async fn index(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let posts = latest_posts(&state.db, state.config.content.posts_per_page, true)?;
    Ok(view(
        "Home",
        HomeProps {
            site: site_info(&state),
            posts: posts.iter().map(|p| state.presenter.resource(p)).collect(),
        },
    )
    .into_response())
}

#[derive(Deserialize, Default)]
pub struct PublicPostsQuery {
    search: Option<String>,
    page: Option<String>,
}

#[derive(Serialize)]
struct SearchFilter {
    search: Option<String>,
}

#[derive(Serialize)]
struct PostsProps<'a> {
    site: SiteInfo<'a>,
    posts: Page<PostResource>,
    filters: SearchFilter,
}

pub async fn posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PublicPostsQuery>,
) -> AppResult<Response> {
    let filter = PostFilter::published(
        query.search.as_deref(),
        query.page.as_deref(),
        state.config.content.posts_per_page,
    );
    let page = query_posts(&state.db, &filter)?;

    Ok(view(
        "Posts/Index",
        PostsProps {
            site: site_info(&state),
            posts: page.map(|item| state.presenter.resource(&item)),
            filters: SearchFilter {
                search: filter.search.clone(),
            },
        },
    )
    .into_response())
}

#[derive(Serialize)]
struct PostProps<'a> {
    site: SiteInfo<'a>,
    post: PostDetail,
    related: Vec<PostCard>,
}

pub async fn post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let item = get_published_by_slug(&state.db, &slug)?.ok_or(ServiceError::NotFound("post"))?;
    let related = related_posts(&state.db, &item.post, state.config.content.related_posts)?;

    Ok(view(
        "Posts/Show",
        PostProps {
            site: site_info(&state),
            post: state.presenter.detail(&item),
            related: related.iter().map(|p| state.presenter.card(p)).collect(),
        },
    )
    .into_response())
}
