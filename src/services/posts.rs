use super::bulk::{self, BulkReport};
use super::categories::category_exists;
use super::error::ServiceError;
use super::slug::generate_post_slug;
use super::tags::tag_exists;
use super::thumbnails::{self, ThumbnailStore};
use super::validation::{parse_id, required_name, ValidationErrors};
use crate::models::{Category, Post, PostForm, PostStats, PostStatus, PostWithRelations, Tag};
use crate::Database;
use anyhow::{bail, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashMap;

pub(crate) const POST_COLUMNS: &str =
    "p.id, p.title, p.slug, p.content, p.thumbnail, p.status, p.category_id, p.created_at, p.updated_at";

const MAX_SLUG_ATTEMPTS: usize = 16;

pub(crate) fn row_to_post(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        thumbnail: row.get(4)?,
        status: row
            .get::<_, String>(5)?
            .parse()
            .unwrap_or(PostStatus::Draft),
        category_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// A post form that passed validation.
#[derive(Debug)]
pub struct ValidatedPost {
    pub title: String,
    pub content: Option<String>,
    pub status: PostStatus,
    pub category_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub thumbnail: Option<Vec<u8>>,
}

/// Validates every field and reports all problems at once.
pub fn validate_post_form(
    db: &Database,
    form: &PostForm,
    max_thumbnail_bytes: usize,
) -> Result<ValidatedPost> {
    let mut errors = ValidationErrors::new();

    let title = required_name(&mut errors, "title", form.title.as_deref());

    let content = form
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(ammonia::clean);

    let status = match form.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            errors.add("status", "The status field is required.");
            None
        }
        Some(raw) => match raw.parse::<PostStatus>() {
            Ok(status) => Some(status),
            Err(()) => {
                errors.add("status", "The selected status is invalid.");
                None
            }
        },
    };

    let category_id = match form.category_id.as_deref().map(parse_id) {
        None | Some(Ok(None)) => None,
        Some(Ok(Some(id))) => {
            if category_exists(db, id)? {
                Some(id)
            } else {
                errors.add("category_id", "The selected category id is invalid.");
                None
            }
        }
        Some(Err(())) => {
            errors.add("category_id", "The selected category id is invalid.");
            None
        }
    };

    let mut tag_ids = Vec::with_capacity(form.tags.len());
    for (index, raw) in form.tags.iter().enumerate() {
        let valid = match parse_id(raw) {
            Ok(None) => continue,
            Ok(Some(id)) => tag_exists(db, id)?.then_some(id),
            Err(()) => None,
        };
        match valid {
            Some(id) if !tag_ids.contains(&id) => tag_ids.push(id),
            Some(_) => {}
            None => errors.add(
                format!("tags.{}", index),
                format!("The selected tags.{} is invalid.", index),
            ),
        }
    }

    let thumbnail = match &form.thumbnail {
        Some(upload) if !upload.data.is_empty() => {
            if !thumbnails::is_image(&upload.data) {
                errors.add("thumbnail", "The thumbnail field must be an image.");
            }
            if upload.data.len() > max_thumbnail_bytes {
                errors.add(
                    "thumbnail",
                    format!(
                        "The thumbnail field must not be greater than {} kilobytes.",
                        max_thumbnail_bytes / 1024
                    ),
                );
            }
            Some(upload.data.clone())
        }
        _ => None,
    };

    errors.into_result()?;

    match (title, status) {
        (Some(title), Some(status)) => Ok(ValidatedPost {
            title,
            content,
            status,
            category_id,
            tag_ids,
            thumbnail,
        }),
        _ => bail!("post form validated without a title or status"),
    }
}

fn slug_taken(conn: &Connection, slug: &str) -> Result<bool> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = ?)",
        [slug],
        |row| row.get(0),
    )?;
    Ok(taken)
}

fn unique_post_slug(conn: &Connection, title: &str) -> Result<String> {
    for _ in 0..MAX_SLUG_ATTEMPTS {
        let candidate = generate_post_slug(title);
        if !slug_taken(conn, &candidate)? {
            return Ok(candidate);
        }
    }
    bail!("exhausted attempts to find a unique slug for `{}`", title)
}

fn attach_tags(conn: &Connection, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO post_tag (post_id, tag_id) VALUES (?, ?)",
            (post_id, tag_id),
        )?;
    }
    Ok(())
}

pub fn create_post(
    db: &Database,
    store: &ThumbnailStore,
    form: &PostForm,
    max_thumbnail_bytes: usize,
) -> Result<Post> {
    let input = validate_post_form(db, form, max_thumbnail_bytes)?;

    let thumbnail = match &input.thumbnail {
        Some(data) => Some(store.store(data)?),
        None => None,
    };

    let inserted = insert_post(db, &input, thumbnail.as_deref());
    if inserted.is_err() {
        if let Some(path) = &thumbnail {
            store.remove(path);
        }
    }
    let id = inserted?;

    let post = get_post(db, id)?.ok_or(ServiceError::NotFound("post"))?;
    tracing::info!(id, slug = %post.slug, status = %post.status, "Created post");
    Ok(post)
}

fn insert_post(db: &Database, input: &ValidatedPost, thumbnail: Option<&str>) -> Result<i64> {
    let mut conn = db.get()?;
    let tx = conn.transaction()?;

    let slug = unique_post_slug(&tx, &input.title)?;
    tx.execute(
        r#"
        INSERT INTO posts (title, slug, content, thumbnail, status, category_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        (
            &input.title,
            &slug,
            &input.content,
            thumbnail,
            input.status.to_string(),
            input.category_id,
        ),
    )?;
    let id = tx.last_insert_rowid();
    attach_tags(&tx, id, &input.tag_ids)?;
    tx.commit()?;

    Ok(id)
}

/// Rewrites a post. A replacement thumbnail is stored before the row changes
/// and the old file is removed only once the update has committed; a failed
/// update removes the new file and leaves the old one in place.
pub fn update_post(
    db: &Database,
    store: &ThumbnailStore,
    id: i64,
    form: &PostForm,
    max_thumbnail_bytes: usize,
) -> Result<Post> {
    let current = get_post(db, id)?.ok_or(ServiceError::NotFound("post"))?;
    let input = validate_post_form(db, form, max_thumbnail_bytes)?;

    let stored = match &input.thumbnail {
        Some(data) => Some(store.store(data)?),
        None => None,
    };
    let thumbnail = match (&stored, form.remove_thumbnail) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => None,
        (None, false) => current.thumbnail.clone(),
    };

    if let Err(e) = write_post_update(db, &current, &input, thumbnail.as_deref()) {
        if let Some(path) = &stored {
            store.remove(path);
        }
        return Err(e);
    }

    if let Some(old) = &current.thumbnail {
        if thumbnail.as_deref() != Some(old.as_str()) {
            store.remove(old);
        }
    }

    let post = get_post(db, id)?.ok_or(ServiceError::NotFound("post"))?;
    tracing::info!(id, slug = %post.slug, "Updated post");
    Ok(post)
}

fn write_post_update(
    db: &Database,
    current: &Post,
    input: &ValidatedPost,
    thumbnail: Option<&str>,
) -> Result<()> {
    let mut conn = db.get()?;
    let tx = conn.transaction()?;

    let slug = if current.title != input.title {
        unique_post_slug(&tx, &input.title)?
    } else {
        current.slug.clone()
    };

    tx.execute(
        r#"
        UPDATE posts SET title = ?, slug = ?, content = ?, thumbnail = ?, status = ?, category_id = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
        (
            &input.title,
            &slug,
            &input.content,
            thumbnail,
            input.status.to_string(),
            input.category_id,
            current.id,
        ),
    )?;
    tx.execute("DELETE FROM post_tag WHERE post_id = ?", [current.id])?;
    attach_tags(&tx, current.id, &input.tag_ids)?;
    tx.commit()?;

    Ok(())
}

/// Deletes a post, its tag links and its thumbnail file.
///
/// Returns `Ok(false)` when there was no such post. The file goes first and
/// is not restored if the row delete fails afterwards.
pub fn delete_post(db: &Database, store: &ThumbnailStore, id: i64) -> Result<bool> {
    let Some(post) = get_post(db, id)? else {
        return Ok(false);
    };

    if let Some(path) = &post.thumbnail {
        store.remove(path);
    }

    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM post_tag WHERE post_id = ?", [id])?;
    let affected = tx.execute("DELETE FROM posts WHERE id = ?", [id])?;
    tx.commit()?;

    tracing::info!(id, slug = %post.slug, "Deleted post");
    Ok(affected > 0)
}

pub fn bulk_delete_posts(db: &Database, store: &ThumbnailStore, ids: &[i64]) -> BulkReport {
    let report = bulk::delete_each(ids, |id| delete_post(db, store, id));
    tracing::info!(
        deleted = report.deleted,
        failed = report.failed(),
        requested = ids.len(),
        "Bulk deleted posts"
    );
    report
}

/// Flips published ↔ draft and returns the new status.
pub fn toggle_status(db: &Database, id: i64) -> Result<PostStatus> {
    let conn = db.get()?;
    let current: Option<String> = conn
        .query_row("SELECT status FROM posts WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    let Some(current) = current else {
        return Err(ServiceError::NotFound("post").into());
    };

    let next = current
        .parse::<PostStatus>()
        .unwrap_or(PostStatus::Draft)
        .toggled();
    conn.execute(
        "UPDATE posts SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        (next.to_string(), id),
    )?;
    tracing::info!(id, status = %next, "Toggled post status");
    Ok(next)
}

pub fn get_post(db: &Database, id: i64) -> Result<Option<Post>> {
    let conn = db.get()?;
    let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_post).optional()?)
}

pub fn get_post_by_slug(db: &Database, slug: &str) -> Result<Option<Post>> {
    let conn = db.get()?;
    let sql = format!("SELECT {} FROM posts p WHERE p.slug = ?", POST_COLUMNS);
    Ok(conn.query_row(&sql, [slug], row_to_post).optional()?)
}

pub fn get_post_with_relations(db: &Database, id: i64) -> Result<Option<PostWithRelations>> {
    match get_post(db, id)? {
        Some(post) => {
            let conn = db.get()?;
            Ok(load_relations(&conn, vec![post])?.pop())
        }
        None => Ok(None),
    }
}

/// Published post by slug; drafts are invisible here.
pub fn get_published_by_slug(db: &Database, slug: &str) -> Result<Option<PostWithRelations>> {
    match get_post_by_slug(db, slug)? {
        Some(post) if post.status == PostStatus::Published => {
            let conn = db.get()?;
            Ok(load_relations(&conn, vec![post])?.pop())
        }
        _ => Ok(None),
    }
}

/// Attaches categories and tags to a batch of posts with two queries.
pub(crate) fn load_relations(conn: &Connection, posts: Vec<Post>) -> Result<Vec<PostWithRelations>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let mut category_ids: Vec<i64> = posts.iter().filter_map(|p| p.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let mut categories_by_id: HashMap<i64, Category> = HashMap::new();
    if !category_ids.is_empty() {
        let sql = format!(
            "SELECT id, name, slug, created_at, updated_at FROM categories WHERE id IN ({})",
            placeholders(category_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(category_ids.iter()), |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;
        for category in rows {
            let category = category?;
            categories_by_id.insert(category.id, category);
        }
    }

    let sql = format!(
        "SELECT pt.post_id, t.id, t.name, t.slug, t.created_at, t.updated_at
         FROM tags t
         JOIN post_tag pt ON t.id = pt.tag_id
         WHERE pt.post_id IN ({})
         ORDER BY t.name, t.id",
        placeholders(post_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(post_ids.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            Tag {
                id: row.get(1)?,
                name: row.get(2)?,
                slug: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            },
        ))
    })?;
    let mut tags_by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        let (post_id, tag) = row?;
        tags_by_post.entry(post_id).or_default().push(tag);
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let category = post
                .category_id
                .and_then(|id| categories_by_id.get(&id).cloned());
            let tags = tags_by_post.remove(&post.id).unwrap_or_default();
            PostWithRelations {
                post,
                category,
                tags,
            }
        })
        .collect())
}

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

pub fn post_stats(db: &Database) -> Result<PostStats> {
    let conn = db.get()?;
    let (total_posts, published, drafts) = conn.query_row(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN status = 'published' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = 'draft' THEN 1 ELSE 0 END), 0)
        FROM posts
        "#,
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(PostStats {
        total_posts,
        published,
        drafts,
    })
}

/// Newest posts first, optionally restricted to published ones.
pub fn latest_posts(db: &Database, limit: usize, published_only: bool) -> Result<Vec<PostWithRelations>> {
    let conn = db.get()?;
    let filter = if published_only {
        "WHERE p.status = 'published'"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {} FROM posts p {} ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
        POST_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map([limit as i64], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);
    load_relations(&conn, posts)
}

/// Published posts sharing the category or at least one tag, newest first.
pub fn related_posts(db: &Database, post: &Post, limit: usize) -> Result<Vec<Post>> {
    let conn = db.get()?;
    let sql = format!(
        r#"
        SELECT {} FROM posts p
        WHERE p.status = 'published' AND p.id != ?1
          AND ((?2 IS NOT NULL AND p.category_id = ?2)
               OR EXISTS (
                   SELECT 1 FROM post_tag pt
                   WHERE pt.post_id = p.id
                     AND pt.tag_id IN (SELECT tag_id FROM post_tag WHERE post_id = ?1)))
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT ?3
        "#,
        POST_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map((post.id, post.category_id, limit as i64), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}
