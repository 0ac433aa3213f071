use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// An image as posted by clients; the id is minted server-side.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewImage {
    pub url: String,
    #[serde(default)]
    pub main: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub images: Option<Vec<NewImage>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddImagesRequest {
    pub images: Vec<NewImage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveImagesRequest {
    pub image_ids: Vec<Uuid>,
}

/// Body of both similar-product mutations; `similar` must be an array of
/// product ids.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SimilarProductsRequest {
    pub similar: Vec<Uuid>,
}
