use serde::Serialize;
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

/// Reference data offered on the complaint form
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComplaintCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Ordered subcategory labels
    pub subcategories: Json<Vec<String>>,
}

impl ComplaintCategory {
    pub fn has_subcategory(&self, label: &str) -> bool {
        self.subcategories.iter().any(|s| s == label)
    }
}
