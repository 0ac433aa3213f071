use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::products::{
        AddImagesRequest, CreateProductRequest, NewImage, RemoveImagesRequest,
        SimilarProductsRequest,
    },
    models::{Comment, Image, Product},
    routes::{health, params, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::search_products,
        products::get_product,
        products::create_product,
        products::delete_product,
        products::add_product_images,
        products::remove_product_images,
        products::list_similar_products,
        products::add_similar_products,
        products::remove_similar_products,
        products::list_not_similar_products,
    ),
    components(
        schemas(
            Product,
            Comment,
            Image,
            CreateProductRequest,
            NewImage,
            AddImagesRequest,
            RemoveImagesRequest,
            SimilarProductsRequest,
            params::ProductSearchQuery,
            health::HealthData,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
