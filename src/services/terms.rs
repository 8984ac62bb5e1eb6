//! Shared storage for the two name-only taxonomies, categories and tags.
//!
//! Table names are compile-time constants and are the only thing ever
//! interpolated into the SQL below.

use super::bulk::{self, BulkReport};
use super::error::ServiceError;
use super::pagination::{Page, PageRequest};
use super::slug::generate_slug;
use super::validation::{required_name, ValidationErrors};
use crate::models::{Named, TermForm};
use crate::Database;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

pub(crate) struct TermTable {
    pub table: &'static str,
    pub noun: &'static str,
    pub plural: &'static str,
    /// Correlated subquery counting the posts attached to `t.id`.
    pub posts_count: &'static str,
}

pub(crate) const CATEGORIES: TermTable = TermTable {
    table: "categories",
    noun: "category",
    plural: "categories",
    posts_count: "(SELECT COUNT(*) FROM posts p WHERE p.category_id = t.id)",
};

pub(crate) const TAGS: TermTable = TermTable {
    table: "tags",
    noun: "tag",
    plural: "tags",
    posts_count: "(SELECT COUNT(*) FROM post_tag pt WHERE pt.tag_id = t.id)",
};

pub struct TermRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_term(row: &Row) -> rusqlite::Result<TermRow> {
    Ok(TermRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl TermTable {
    pub fn get(&self, db: &Database, id: i64) -> Result<Option<TermRow>> {
        let conn = db.get()?;
        let sql = format!(
            "SELECT id, name, slug, created_at, updated_at FROM {} WHERE id = ?",
            self.table
        );
        Ok(conn.query_row(&sql, [id], row_to_term).optional()?)
    }

    pub fn exists(&self, db: &Database, id: i64) -> Result<bool> {
        let conn = db.get()?;
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", self.table);
        let exists: bool = conn.query_row(&sql, [id], |row| row.get(0))?;
        Ok(exists)
    }

    /// Every term as `{id, name}`, ordered by name, for filter dropdowns.
    pub fn list_named(&self, db: &Database) -> Result<Vec<Named>> {
        let conn = db.get()?;
        let sql = format!("SELECT id, name FROM {} ORDER BY name, id", self.table);
        let mut stmt = conn.prepare(&sql)?;
        let terms = stmt
            .query_map([], |row| {
                Ok(Named {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(terms)
    }

    /// Name-ordered page of terms with their post counts.
    pub fn list(
        &self,
        db: &Database,
        search: Option<&str>,
        request: PageRequest,
    ) -> Result<Page<(TermRow, i64)>> {
        let conn = db.get()?;
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_needle);

        let where_clause = if needle.is_some() {
            " WHERE fold_case(t.name) LIKE ?1 ESCAPE '\\'"
        } else {
            ""
        };

        let count_sql = format!("SELECT COUNT(*) FROM {} t{}", self.table, where_clause);
        let total: i64 = match &needle {
            Some(n) => conn.query_row(&count_sql, [n], |row| row.get(0))?,
            None => conn.query_row(&count_sql, [], |row| row.get(0))?,
        };

        if !request.in_bounds {
            return Ok(Page::new(Vec::new(), total, request));
        }

        let sql = format!(
            "SELECT t.id, t.name, t.slug, t.created_at, t.updated_at, {} AS posts_count
             FROM {} t{} ORDER BY t.name, t.id LIMIT {} OFFSET {}",
            self.posts_count,
            self.table,
            where_clause,
            request.limit(),
            request.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &Row| -> rusqlite::Result<(TermRow, i64)> {
            Ok((row_to_term(row)?, row.get(5)?))
        };
        let rows = match &needle {
            Some(n) => stmt
                .query_map([n], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Page::new(rows, total, request))
    }

    fn validate(&self, db: &Database, form: &TermForm, current_id: Option<i64>) -> Result<(String, String)> {
        let mut errors = ValidationErrors::new();
        let Some(name) = required_name(&mut errors, "name", form.name.as_deref()) else {
            return Err(ServiceError::Validation(errors).into());
        };

        let slug = generate_slug(&name);
        if slug.is_empty() {
            errors.add("name", "The name must contain at least one letter or number.");
            return Err(ServiceError::Validation(errors).into());
        }

        let conn = db.get()?;
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE slug = ?1 AND id != ?2)",
            self.table
        );
        let taken: bool = conn.query_row(&sql, (&slug, current_id.unwrap_or(0)), |row| row.get(0))?;
        if taken {
            errors.add("name", "The name has already been taken.");
        }
        errors.into_result()?;

        Ok((name, slug))
    }

    pub fn create(&self, db: &Database, form: &TermForm) -> Result<i64> {
        let (name, slug) = self.validate(db, form, None)?;
        let conn = db.get()?;
        let sql = format!("INSERT INTO {} (name, slug) VALUES (?, ?)", self.table);
        conn.execute(&sql, (&name, &slug))?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, name = %name, "Created {}", self.noun);
        Ok(id)
    }

    pub fn update(&self, db: &Database, id: i64, form: &TermForm) -> Result<()> {
        if !self.exists(db, id)? {
            return Err(ServiceError::NotFound(self.noun).into());
        }
        let (name, slug) = self.validate(db, form, Some(id))?;
        let conn = db.get()?;
        let sql = format!(
            "UPDATE {} SET name = ?, slug = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            self.table
        );
        conn.execute(&sql, (&name, &slug, id))?;
        tracing::info!(id, name = %name, "Updated {}", self.noun);
        Ok(())
    }

    /// Deletes one term; `Ok(false)` when it did not exist.
    ///
    /// Posts keep existing: the category reference is nulled and tag links
    /// are dropped by the foreign keys.
    pub fn delete(&self, db: &Database, id: i64) -> Result<bool> {
        let conn = db.get()?;
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        let affected = conn.execute(&sql, [id])?;
        if affected > 0 {
            tracing::info!(id, "Deleted {}", self.noun);
        }
        Ok(affected > 0)
    }

    pub fn bulk_delete(&self, db: &Database, ids: &[i64]) -> BulkReport {
        let report = bulk::delete_each(ids, |id| self.delete(db, id));
        tracing::info!(
            deleted = report.deleted,
            requested = ids.len(),
            "Bulk deleted {}",
            self.plural
        );
        report
    }
}

/// Case-folded `%needle%` pattern for matching against `fold_case(column)`.
pub(crate) fn like_needle(search: &str) -> String {
    format!("%{}%", escape_like(&search.to_lowercase()))
}

/// Escapes LIKE wildcards so user input matches literally (with `ESCAPE '\'`).
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
