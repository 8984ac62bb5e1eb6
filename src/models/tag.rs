use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub posts_count: i64,
}

/// Name-only form shared by the category and tag admin screens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermForm {
    #[serde(default)]
    pub name: Option<String>,
}

/// `{id, name}` pair used for filter dropdowns and nested relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub id: i64,
    pub name: String,
}
