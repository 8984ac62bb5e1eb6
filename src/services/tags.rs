use super::bulk::BulkReport;
use super::pagination::{Page, PageRequest};
use super::terms::{TermRow, TAGS};
use crate::models::{Named, Tag, TagWithCount, TermForm};
use crate::Database;
use anyhow::Result;

impl From<TermRow> for Tag {
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

pub fn create_tag(db: &Database, form: &TermForm) -> Result<i64> {
    TAGS.create(db, form)
}

pub fn update_tag(db: &Database, id: i64, form: &TermForm) -> Result<()> {
    TAGS.update(db, id, form)
}

pub fn get_tag(db: &Database, id: i64) -> Result<Option<Tag>> {
    Ok(TAGS.get(db, id)?.map(Tag::from))
}

pub fn tag_exists(db: &Database, id: i64) -> Result<bool> {
    TAGS.exists(db, id)
}

pub fn list_tag_names(db: &Database) -> Result<Vec<Named>> {
    TAGS.list_named(db)
}

pub fn list_tags(
    db: &Database,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<TagWithCount>> {
    let page = TAGS.list(db, search, request)?;
    Ok(page.map(|(row, posts_count)| TagWithCount {
        tag: row.into(),
        posts_count,
    }))
}

pub fn delete_tag(db: &Database, id: i64) -> Result<bool> {
    TAGS.delete(db, id)
}

pub fn bulk_delete_tags(db: &Database, ids: &[i64]) -> BulkReport {
    TAGS.bulk_delete(db, ids)
}
