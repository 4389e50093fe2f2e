use serde::{Deserialize, Serialize};

/// Job category. Inactive categories are hidden from the public catalogue
/// and cannot be attached to new postings, but existing postings keep
/// pointing at them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}
