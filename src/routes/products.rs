use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{
        AddImagesRequest, CreateProductRequest, RemoveImagesRequest, SimilarProductsRequest,
    },
    enhance,
    error::{AppError, AppResult},
    models::{Comment, Image, Product},
    routes::params::ProductSearchQuery,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/remove-images", post(remove_product_images))
        .route("/{id}", get(get_product).delete(delete_product))
        .route("/{id}/images", post(add_product_images))
        .route(
            "/{id}/similar",
            get(list_similar_products)
                .put(add_similar_products)
                .delete(remove_similar_products),
        )
        .route("/{id}/not-similar", get(list_not_similar_products))
}

/// Load comments and images for `products` and attach them in memory.
/// Issues no queries at all when the product list is empty.
pub async fn attach_relations(pool: &DbPool, products: &mut [Product]) -> AppResult<()> {
    if products.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

    let comments =
        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE product_id = ANY($1)")
            .bind(ids.clone())
            .fetch_all(pool)
            .await?;
    let images = sqlx::query_as::<_, Image>("SELECT * FROM images WHERE product_id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    enhance::attach_comments(products, comments);
    enhance::attach_images(products, images);
    Ok(())
}

async fn insert_images(pool: &DbPool, images: &[Image]) -> AppResult<()> {
    let mut qb = QueryBuilder::new("INSERT INTO images (id, product_id, url, is_main) ");
    qb.push_values(images, |mut b, image| {
        b.push_bind(image.id)
            .push_bind(image.product_id)
            .push_bind(&image.url)
            .push_bind(image.main);
    });
    qb.build().execute(pool).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products with comments, images and thumbnail attached", body = Vec<Product>)
    ),
    tag = "Products"
)]
pub async fn list_products(State(pool): State<DbPool>) -> AppResult<Json<Vec<Product>>> {
    let mut products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at")
        .fetch_all(&pool)
        .await?;
    attach_relations(&pool, &mut products).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(
        ("title" = Option<String>, Query, description = "Substring match on the title"),
        ("min_price" = Option<i64>, Query, description = "Lower price bound, inclusive"),
        ("max_price" = Option<i64>, Query, description = "Upper price bound, inclusive"),
    ),
    responses(
        (status = 200, description = "Matching products, enhanced; empty array when nothing matches", body = Vec<Product>)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(pool): State<DbPool>,
    Query(query): Query<ProductSearchQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let mut qb = query.build_query();
    let mut products = qb.build_query_as::<Product>().fetch_all(&pool).await?;
    attach_relations(&pool, &mut products).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "The product with comments, images and thumbnail attached", body = Product),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    let mut product = match product {
        Some(p) => p,
        None => return Err(AppError::ProductNotFound(id)),
    };
    attach_relations(&pool, std::slice::from_mut(&mut product)).await?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created; the body names the generated id", body = String),
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(pool): State<DbPool>,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, String)> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, title, description, price) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.price)
        .execute(&pool)
        .await?;

    let images: Vec<Image> = payload
        .images
        .unwrap_or_default()
        .into_iter()
        .map(|image| Image::new(id, image.url, image.main))
        .collect();
    if !images.is_empty() {
        insert_images(&pool, &images).await?;
    }

    if let Err(err) = log_audit(
        &pool,
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": id, "images": images.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((
        StatusCode::CREATED,
        format!("Product with id {id} has been created"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted, empty body"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    // Children first, product row last. No transaction: a failure partway
    // leaves the earlier deletes in place.
    sqlx::query("DELETE FROM images WHERE product_id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM comments WHERE product_id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::ProductNotFound(id));
    }

    if let Err(err) = log_audit(
        &pool,
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = AddImagesRequest,
    responses(
        (status = 201, description = "Images added", body = String),
        (status = 400, description = "Images array is empty"),
    ),
    tag = "Products"
)]
pub async fn add_product_images(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImagesRequest>,
) -> AppResult<(StatusCode, String)> {
    if payload.images.is_empty() {
        return Err(AppError::BadRequest("Images array is empty".to_string()));
    }

    // No existence probe for the product; the images FK is the only guard.
    let images: Vec<Image> = payload
        .images
        .into_iter()
        .map(|image| Image::new(id, image.url, image.main))
        .collect();
    insert_images(&pool, &images).await?;

    if let Err(err) = log_audit(
        &pool,
        "images_add",
        Some("images"),
        Some(serde_json::json!({ "product_id": id, "images": images.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((StatusCode::CREATED, "Images have been added".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/products/remove-images",
    request_body = RemoveImagesRequest,
    responses(
        (status = 200, description = "Images removed", body = String),
        (status = 400, description = "Images array is empty"),
        (status = 404, description = "No image matched the given ids"),
    ),
    tag = "Products"
)]
pub async fn remove_product_images(
    State(pool): State<DbPool>,
    Json(payload): Json<RemoveImagesRequest>,
) -> AppResult<(StatusCode, String)> {
    if payload.image_ids.is_empty() {
        return Err(AppError::BadRequest("Images array is empty".to_string()));
    }

    let result = sqlx::query("DELETE FROM images WHERE id = ANY($1)")
        .bind(payload.image_ids.clone())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "No one image has been removed".to_string(),
        ));
    }

    if let Err(err) = log_audit(
        &pool,
        "images_remove",
        Some("images"),
        Some(serde_json::json!({ "removed": result.rows_affected() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((StatusCode::OK, "Images have been removed".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/similar",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Products recorded as similar, possibly empty", body = Vec<Product>)
    ),
    tag = "Products"
)]
pub async fn list_similar_products(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.*
        FROM product_similar ps
        JOIN products p ON p.id = ps.similar_product_id
        WHERE ps.product_id = $1
        ORDER BY p.created_at
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(products))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/similar",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SimilarProductsRequest,
    responses(
        (status = 204, description = "Edges recorded; duplicates are ignored"),
        (status = 400, description = "Body failed validation"),
    ),
    tag = "Products"
)]
pub async fn add_similar_products(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SimilarProductsRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(payload) =
        payload.map_err(|_| AppError::validation("similar", "must be an array of product ids"))?;

    if !payload.similar.is_empty() {
        let mut qb =
            QueryBuilder::new("INSERT INTO product_similar (product_id, similar_product_id) ");
        qb.push_values(payload.similar.iter(), |mut b, similar_id| {
            b.push_bind(id).push_bind(*similar_id);
        });
        qb.push(" ON CONFLICT DO NOTHING");
        qb.build().execute(&pool).await?;
    }

    if let Err(err) = log_audit(
        &pool,
        "similar_add",
        Some("product_similar"),
        Some(serde_json::json!({ "product_id": id, "edges": payload.similar.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/similar",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SimilarProductsRequest,
    responses(
        (status = 204, description = "Edges removed"),
        (status = 400, description = "Body failed validation"),
    ),
    tag = "Products"
)]
pub async fn remove_similar_products(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SimilarProductsRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(payload) =
        payload.map_err(|_| AppError::validation("similar", "must be an array of product ids"))?;

    sqlx::query("DELETE FROM product_similar WHERE product_id = $1 AND similar_product_id = ANY($2)")
        .bind(id)
        .bind(payload.similar.clone())
        .execute(&pool)
        .await?;

    if let Err(err) = log_audit(
        &pool,
        "similar_remove",
        Some("product_similar"),
        Some(serde_json::json!({ "product_id": id, "edges": payload.similar.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/not-similar",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Products not yet recorded as similar to this one", body = Vec<Product>)
    ),
    tag = "Products"
)]
pub async fn list_not_similar_products(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.*
        FROM products p
        WHERE p.id <> $1
          AND p.id NOT IN (
              SELECT similar_product_id FROM product_similar WHERE product_id = $1
          )
        ORDER BY p.created_at
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(products))
}
