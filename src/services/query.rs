//! Translation of list query parameters into a filtered, sorted, paginated
//! post listing.
//!
//! Parameters arrive as raw strings. Anything unrecognized degrades to "no
//! filter" or to the default ordering instead of failing the request.

use super::pagination::{Page, PageRequest};
use super::posts::{load_relations, row_to_post, POST_COLUMNS};
use super::terms::like_needle;
use crate::models::{PostStatus, PostWithRelations};
use crate::Database;
use anyhow::Result;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Query string of the post listings, exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilterParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    CreatedAt,
    Status,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(Self::Title),
            "created_at" => Some(Self::CreatedAt),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn order_expr(self) -> &'static str {
        match self {
            Self::Title => "p.title COLLATE NOCASE",
            Self::CreatedAt => "p.created_at",
            Self::Status => "p.status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc` in any case is ascending; everything else is descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(d) if d.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The filter actually applied. Serialized back to the caller so the current
/// filter state can be re-rendered without any server-side memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostFilter {
    pub search: Option<String>,
    pub category: Option<i64>,
    pub tag: Option<i64>,
    pub status: Option<PostStatus>,
    pub sort: SortField,
    pub dir: SortDirection,
    pub per_page: i64,
    pub page: i64,
    #[serde(skip)]
    pub paging: PageRequest,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_filter_id(value: &Option<String>) -> Option<i64> {
    non_empty(value).and_then(|v| v.parse::<i64>().ok())
}

impl PostFilter {
    pub fn from_params(params: &PostFilterParams, default_per_page: usize, max_per_page: usize) -> Self {
        let (sort, dir) = match non_empty(&params.sort).and_then(SortField::parse) {
            Some(field) => (field, SortDirection::parse(params.dir.as_deref())),
            None => (SortField::CreatedAt, SortDirection::Desc),
        };

        let paging = PageRequest::parse(
            params.page.as_deref(),
            params.per_page.as_deref(),
            default_per_page,
            max_per_page,
        );

        Self {
            search: non_empty(&params.search).map(String::from),
            category: parse_filter_id(&params.category),
            tag: parse_filter_id(&params.tag),
            status: non_empty(&params.status).and_then(|s| s.parse().ok()),
            sort,
            dir,
            per_page: paging.per_page,
            page: paging.page,
            paging,
        }
    }

    /// Public listing: published posts only, newest first, fixed page size.
    pub fn published(search: Option<&str>, page: Option<&str>, per_page: usize) -> Self {
        let paging = PageRequest::parse(page, None, per_page, per_page);
        Self {
            search: search.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            category: None,
            tag: None,
            status: Some(PostStatus::Published),
            sort: SortField::CreatedAt,
            dir: SortDirection::Desc,
            per_page: paging.per_page,
            page: paging.page,
            paging,
        }
    }

    /// WHERE clause and its bound values. Filters are AND-ed; the search
    /// needle is OR-ed across title, content and slug.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        if let Some(search) = &self.search {
            let needle = like_needle(search);
            sql.push_str(
                " AND (fold_case(p.title) LIKE ? ESCAPE '\\' \
                 OR fold_case(p.content) LIKE ? ESCAPE '\\' \
                 OR fold_case(p.slug) LIKE ? ESCAPE '\\')",
            );
            for _ in 0..3 {
                params.push(Value::Text(needle.clone()));
            }
        }
        if let Some(category) = self.category {
            sql.push_str(" AND p.category_id = ?");
            params.push(Value::Integer(category));
        }
        if let Some(tag) = self.tag {
            sql.push_str(" AND EXISTS (SELECT 1 FROM post_tag pt WHERE pt.post_id = p.id AND pt.tag_id = ?)");
            params.push(Value::Integer(tag));
        }
        if let Some(status) = self.status {
            sql.push_str(" AND p.status = ?");
            params.push(Value::Text(status.to_string()));
        }

        (sql, params)
    }

    fn order_clause(&self) -> String {
        let dir = self.dir.sql();
        format!(" ORDER BY {} {}, p.id {}", self.sort.order_expr(), dir, dir)
    }
}

/// Runs the filter and returns one page of posts with their relations loaded.
pub fn query_posts(db: &Database, filter: &PostFilter) -> Result<Page<PostWithRelations>> {
    let conn = db.get()?;
    let (where_sql, params) = filter.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM posts p{}", where_sql);
    let total: i64 = conn.query_row(&count_sql, rusqlite::params_from_iter(params.iter()), |row| {
        row.get(0)
    })?;

    if !filter.paging.in_bounds {
        return Ok(Page::new(Vec::new(), total, filter.paging));
    }

    let sql = format!(
        "SELECT {} FROM posts p{}{} LIMIT {} OFFSET {}",
        POST_COLUMNS,
        where_sql,
        filter.order_clause(),
        filter.paging.limit(),
        filter.paging.offset()
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    let items = load_relations(&conn, posts)?;
    Ok(Page::new(items, total, filter.paging))
}
