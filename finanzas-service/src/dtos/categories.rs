use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Category;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,

    #[validate(length(max = 30, message = "Color must be at most 30 characters"))]
    pub color: Option<String>,
}

/// Same shape for create and full update.
pub type UpdateCategoryRequest = CreateCategoryRequest;

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.category_id,
            name: category.name,
            color: category.color,
        }
    }
}
