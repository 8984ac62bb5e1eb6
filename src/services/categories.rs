use super::bulk::BulkReport;
use super::pagination::{Page, PageRequest};
use super::terms::{TermRow, CATEGORIES};
use crate::models::{Category, CategoryWithCount, Named, TermForm};
use crate::Database;
use anyhow::Result;

impl From<TermRow> for Category {
    fn from(row: TermRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub fn create_category(db: &Database, form: &TermForm) -> Result<i64> {
    CATEGORIES.create(db, form)
}

pub fn update_category(db: &Database, id: i64, form: &TermForm) -> Result<()> {
    CATEGORIES.update(db, id, form)
}

pub fn get_category(db: &Database, id: i64) -> Result<Option<Category>> {
    Ok(CATEGORIES.get(db, id)?.map(Category::from))
}

pub fn category_exists(db: &Database, id: i64) -> Result<bool> {
    CATEGORIES.exists(db, id)
}

pub fn list_category_names(db: &Database) -> Result<Vec<Named>> {
    CATEGORIES.list_named(db)
}

pub fn list_categories(
    db: &Database,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<CategoryWithCount>> {
    let page = CATEGORIES.list(db, search, request)?;
    Ok(page.map(|(row, posts_count)| CategoryWithCount {
        category: row.into(),
        posts_count,
    }))
}

pub fn delete_category(db: &Database, id: i64) -> Result<bool> {
    CATEGORIES.delete(db, id)
}

pub fn bulk_delete_categories(db: &Database, ids: &[i64]) -> BulkReport {
    CATEGORIES.bulk_delete(db, ids)
}
