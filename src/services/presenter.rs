//! Projection of stored posts into the lean shapes handed to the view layer.

use super::thumbnails::thumbnail_url;
use crate::models::{Named, Post, PostStatus, PostWithRelations};
use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use serde::Serialize;

/// Row of the admin post table and of the public feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResource {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub created_at: String,
    pub status: PostStatus,
    pub thumbnail_url: Option<String>,
    pub category: Option<Named>,
    pub tags: Vec<Named>,
}

/// Everything the edit form and the article page need.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub resource: PostResource,
    pub content: Option<String>,
    pub thumbnail: Option<String>,
    pub category_id: Option<i64>,
    pub updated_at: String,
}

/// Minimal card used for related-post lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub thumbnail_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Presenter {
    base_url: String,
}

impl Presenter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn thumbnail_url(&self, post: &Post) -> Option<String> {
        post.thumbnail
            .as_deref()
            .map(|path| thumbnail_url(&self.base_url, path))
    }

    pub fn resource(&self, item: &PostWithRelations) -> PostResource {
        PostResource {
            id: item.post.id,
            title: item.post.title.clone(),
            slug: item.post.slug.clone(),
            created_at: iso_timestamp(&item.post.created_at),
            status: item.post.status,
            thumbnail_url: self.thumbnail_url(&item.post),
            category: item.category.as_ref().map(|c| Named {
                id: c.id,
                name: c.name.clone(),
            }),
            tags: item
                .tags
                .iter()
                .map(|t| Named {
                    id: t.id,
                    name: t.name.clone(),
                })
                .collect(),
        }
    }

    pub fn detail(&self, item: &PostWithRelations) -> PostDetail {
        PostDetail {
            resource: self.resource(item),
            content: item.post.content.clone(),
            thumbnail: item.post.thumbnail.clone(),
            category_id: item.post.category_id,
            updated_at: iso_timestamp(&item.post.updated_at),
        }
    }

    pub fn card(&self, post: &Post) -> PostCard {
        PostCard {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            thumbnail_url: self.thumbnail_url(post),
            created_at: iso_timestamp(&post.created_at),
        }
    }
}

/// Normalizes SQLite `CURRENT_TIMESTAMP` text (UTC) to RFC 3339.
/// Values in neither format are passed through untouched.
pub fn iso_timestamp(raw: &str) -> String {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    raw.to_string()
}
