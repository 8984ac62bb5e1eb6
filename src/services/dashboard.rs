use super::categories::list_category_names;
use super::posts::{latest_posts, post_stats};
use super::presenter::{iso_timestamp, PostResource, Presenter};
use super::tags::list_tag_names;
use crate::models::Named;
use crate::Database;
use anyhow::Result;
use serde::Serialize;

pub const RECENT_POSTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct LatestPost {
    pub id: i64,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub total_posts: i64,
    pub published: i64,
    pub drafts: i64,
    pub latest_post: Option<LatestPost>,
    pub recent_posts: Vec<PostResource>,
    pub categories: Vec<Named>,
    pub tags: Vec<Named>,
}

/// Counts and recent activity across drafts and published posts alike.
pub fn load_dashboard(db: &Database, presenter: &Presenter) -> Result<Dashboard> {
    let stats = post_stats(db)?;
    let recent = latest_posts(db, RECENT_POSTS, false)?;

    let latest_post = recent.first().map(|item| LatestPost {
        id: item.post.id,
        title: item.post.title.clone(),
        created_at: iso_timestamp(&item.post.created_at),
    });

    Ok(Dashboard {
        total_posts: stats.total_posts,
        published: stats.published,
        drafts: stats.drafts,
        latest_post,
        recent_posts: recent.iter().map(|item| presenter.resource(item)).collect(),
        categories: list_category_names(db)?,
        tags: list_tag_names(db)?,
    })
}
