use serde::{Deserialize, Serialize};

/// Body for creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
