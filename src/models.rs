use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A catalog product. The `comments`, `images` and `thumbnail` fields are not
/// columns; they are attached in memory after the row fetch and stay absent
/// from the JSON when nothing was attached.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub product_id: Uuid,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Image {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    #[sqlx(rename = "is_main")]
    pub main: bool,
}

impl Image {
    /// Build a new image for `product_id` with a freshly generated id; ids
    /// are always minted by the application, never by the store.
    pub fn new(product_id: Uuid, url: String, main: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            url,
            main,
        }
    }
}
