use super::{Category, Tag};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Published,
    Draft,
}

impl PostStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Published => Self::Draft,
            Self::Draft => Self::Published,
        }
    }
}

impl FromStr for PostStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Self::Published),
            "draft" => Ok(Self::Draft),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    /// Path relative to the upload directory, e.g. `thumbnails/<uuid>.png`.
    pub thumbnail: Option<String>,
    pub status: PostStatus,
    pub category_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// A post with its category and tags eagerly loaded.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithRelations {
    #[serde(flatten)]
    pub post: Post,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

/// Bytes of an uploaded file. The client's file name and content type are
/// not kept; the image type is sniffed from the data.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub data: Vec<u8>,
}

/// Raw admin form input for creating or updating a post.
///
/// Values stay as submitted strings; `services::posts` validates them field by field.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub thumbnail: Option<Upload>,
    pub remove_thumbnail: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostStats {
    pub total_posts: i64,
    pub published: i64,
    pub drafts: i64,
}
